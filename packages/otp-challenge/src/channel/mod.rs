//! Delivery channels.
//!
//! A challenge never talks to the network itself; it calls an [`OtpChannel`].
//! Implementations must keep a wrong code distinguishable from every other
//! failure, because only a wrong code consumes a verify attempt.

mod backend;
mod simulated;
mod twilio;

pub use backend::BackendChannel;
pub use simulated::SimulatedChannel;
pub use twilio::TwilioChannel;

use async_trait::async_trait;
use thiserror::Error;

use crate::identifier::Identifier;

/// Result of asking the collaborator to deliver a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub accepted: bool,
}

/// Result of checking a submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The collaborator rejected the code itself
    #[error("Invalid verification code")]
    InvalidCode,

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Transport(String),
}

impl ChannelError {
    pub fn is_invalid_code(&self) -> bool {
        matches!(self, ChannelError::InvalidCode)
    }
}

#[async_trait]
pub trait OtpChannel: Send + Sync {
    /// Deliver a one-time code to the identifier
    async fn send_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError>;

    /// Check a code previously delivered to the identifier
    async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Verification, ChannelError>;

    /// Deliver a fresh code. Same contract as `send_code`.
    async fn resend_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        self.send_code(identifier).await
    }
}

#[async_trait]
impl<T: OtpChannel + ?Sized> OtpChannel for std::sync::Arc<T> {
    async fn send_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        (**self).send_code(identifier).await
    }

    async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Verification, ChannelError> {
        (**self).verify_code(identifier, code).await
    }

    async fn resend_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        (**self).resend_code(identifier).await
    }
}
