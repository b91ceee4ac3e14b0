//! Errors surfaced to the user by a challenge.
//!
//! Every variant is recoverable and meant to be shown inline next to the form.
//! `Display` strings are the user-facing messages.

use thiserror::Error;

use crate::channel::ChannelError;
use crate::identifier::IdentifierError;
use crate::machine::ChallengeStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    /// Client-side validation failed; nothing was sent.
    #[error("{0}")]
    InvalidFormat(String),

    #[error("Invalid verification code. {remaining} attempt{} remaining.", plural(.remaining))]
    InvalidCode { remaining: u32 },

    #[error("Maximum {max} attempts reached. Please request a new code.")]
    VerifyExhausted { max: u32 },

    #[error("Maximum {max} resend attempts reached. Please start over.")]
    ResendExhausted { max: u32 },

    #[error("Please wait {remaining}s before requesting a new code.")]
    ResendCooldown { remaining: u32 },

    /// Collaborator failure; the message is passed through untouched.
    #[error("{0}")]
    TransportError(String),

    #[error("Cannot {action} while the challenge is {status}")]
    InvalidState {
        action: &'static str,
        status: ChallengeStatus,
    },
}

fn plural(n: &u32) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

impl From<IdentifierError> for ChallengeError {
    fn from(err: IdentifierError) -> Self {
        ChallengeError::InvalidFormat(err.to_string())
    }
}

impl From<ChannelError> for ChallengeError {
    fn from(err: ChannelError) -> Self {
        ChallengeError::TransportError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ChallengeError::InvalidCode { remaining: 2 }.to_string(),
            "Invalid verification code. 2 attempts remaining."
        );
        assert_eq!(
            ChallengeError::InvalidCode { remaining: 1 }.to_string(),
            "Invalid verification code. 1 attempt remaining."
        );
        assert_eq!(
            ChallengeError::VerifyExhausted { max: 3 }.to_string(),
            "Maximum 3 attempts reached. Please request a new code."
        );
        assert_eq!(
            ChallengeError::InvalidState {
                action: "verify",
                status: ChallengeStatus::Idle,
            }
            .to_string(),
            "Cannot verify while the challenge is idle"
        );
    }

    #[test]
    fn test_transport_message_verbatim() {
        let err: ChallengeError = ChannelError::Transport("backend unreachable".to_string()).into();
        assert_eq!(err.to_string(), "backend unreachable");
    }

    #[test]
    fn test_identifier_error_is_invalid_format() {
        let err: ChallengeError = IdentifierError::InvalidEmail.into();
        assert_eq!(
            err,
            ChallengeError::InvalidFormat("Please enter a valid email address".to_string())
        );
    }
}
