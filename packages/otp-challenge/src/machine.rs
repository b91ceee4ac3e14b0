//! Challenge decision layer.
//!
//! `ChallengeMachine` interprets events and decides on commands. It is
//! synchronous and does no IO: delivery, verification and the cooldown timer are
//! executed by [`OtpChallenge`](crate::OtpChallenge), which feeds the outcomes
//! back in as events.
//!
//! ```text
//! Idle ──Submit──► SendCode ──CodeDelivered──► AwaitingCode ──CodeAccepted──► Verified
//!                                                  │     ▲
//!                                   CodeRejected×max     │ CodeResent
//!                                                  ▼     │
//!                                                 Locked ┘
//! ```

use std::fmt;

use crate::code::EnteredCode;
use crate::config::ThrottleConfig;
use crate::error::ChallengeError;
use crate::identifier::Identifier;
use crate::ledger::{AttemptLedger, VerifyFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeStatus {
    Idle,
    AwaitingCode,
    Verified,
    Locked,
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeStatus::Idle => write!(f, "idle"),
            ChallengeStatus::AwaitingCode => write!(f, "awaiting a code"),
            ChallengeStatus::Verified => write!(f, "verified"),
            ChallengeStatus::Locked => write!(f, "locked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeState {
    Idle,
    AwaitingCode {
        identifier: Identifier,
        ledger: AttemptLedger,
        code: EnteredCode,
    },
    Verified {
        identifier: Identifier,
        ledger: AttemptLedger,
    },
    Locked {
        identifier: Identifier,
        ledger: AttemptLedger,
    },
}

impl ChallengeState {
    pub fn status(&self) -> ChallengeStatus {
        match self {
            ChallengeState::Idle => ChallengeStatus::Idle,
            ChallengeState::AwaitingCode { .. } => ChallengeStatus::AwaitingCode,
            ChallengeState::Verified { .. } => ChallengeStatus::Verified,
            ChallengeState::Locked { .. } => ChallengeStatus::Locked,
        }
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            ChallengeState::Idle => None,
            ChallengeState::AwaitingCode { identifier, .. }
            | ChallengeState::Verified { identifier, .. }
            | ChallengeState::Locked { identifier, .. } => Some(identifier),
        }
    }

    pub fn ledger(&self) -> Option<&AttemptLedger> {
        match self {
            ChallengeState::Idle => None,
            ChallengeState::AwaitingCode { ledger, .. }
            | ChallengeState::Verified { ledger, .. }
            | ChallengeState::Locked { ledger, .. } => Some(ledger),
        }
    }
}

/// Facts and user intents the machine reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeEvent {
    /// User submitted a validated identifier
    Submit(Identifier),
    /// The channel accepted the first delivery to this identifier
    CodeDelivered(Identifier),
    /// User typed into the code field
    CodeEntered(String),
    /// User pressed verify
    VerifyRequested,
    /// The channel confirmed the code
    CodeAccepted,
    /// The channel reported a wrong code
    CodeRejected,
    /// User pressed resend; carries the cooldown seconds still outstanding
    ResendRequested { cooldown_remaining: u32 },
    /// The channel accepted a re-delivery
    CodeResent,
    /// Identifier edited, mode switched, modal closed or login completed
    Reset,
}

/// IO the effect layer must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeCommand {
    SendCode { identifier: Identifier },
    VerifyCode { identifier: Identifier, code: String },
    ResendCode { identifier: Identifier },
    StartCooldown,
    StopCooldown,
}

#[derive(Debug, Clone)]
pub struct ChallengeMachine {
    config: ThrottleConfig,
    state: ChallengeState,
}

impl ChallengeMachine {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            state: ChallengeState::Idle,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    pub fn status(&self) -> ChallengeStatus {
        self.state.status()
    }

    pub fn verify_attempts(&self) -> u32 {
        self.state.ledger().map_or(0, AttemptLedger::verify_attempts)
    }

    pub fn resend_count(&self) -> u32 {
        self.state.ledger().map_or(0, AttemptLedger::resend_count)
    }

    pub fn entered_code(&self) -> &str {
        match &self.state {
            ChallengeState::AwaitingCode { code, .. } => code.as_str(),
            _ => "",
        }
    }

    /// Whether the verify control should be enabled
    pub fn can_verify(&self) -> bool {
        matches!(&self.state, ChallengeState::AwaitingCode { code, .. } if code.is_complete())
    }

    /// Whether resend is still possible at all (ignores the cooldown)
    pub fn resend_available(&self) -> bool {
        match &self.state {
            ChallengeState::AwaitingCode { ledger, .. } | ChallengeState::Locked { ledger, .. } => {
                !ledger.resend_exhausted()
            }
            _ => false,
        }
    }

    /// Process an event.
    ///
    /// `Ok(Some(cmd))` asks for IO, `Ok(None)` means the event was absorbed,
    /// and `Err` is the message to show the user. State may have changed even
    /// when an error is returned (a wrong code still counts).
    pub fn decide(
        &mut self,
        event: &ChallengeEvent,
    ) -> Result<Option<ChallengeCommand>, ChallengeError> {
        match event {
            ChallengeEvent::Submit(identifier) => match self.state {
                ChallengeState::Idle => Ok(Some(ChallengeCommand::SendCode {
                    identifier: identifier.clone(),
                })),
                _ => Err(self.invalid("request a code")),
            },

            ChallengeEvent::CodeDelivered(identifier) => match self.state {
                ChallengeState::Idle => {
                    self.state = ChallengeState::AwaitingCode {
                        identifier: identifier.clone(),
                        ledger: AttemptLedger::new(&self.config),
                        code: EnteredCode::default(),
                    };
                    Ok(Some(ChallengeCommand::StartCooldown))
                }
                _ => Err(self.invalid("accept a delivery")),
            },

            ChallengeEvent::CodeEntered(input) => match &mut self.state {
                ChallengeState::AwaitingCode { code, .. } => {
                    *code = EnteredCode::from_input(input);
                    Ok(None)
                }
                ChallengeState::Locked { ledger, .. } => Err(ChallengeError::VerifyExhausted {
                    max: ledger.max_verify_attempts(),
                }),
                _ => Err(self.invalid("enter a code")),
            },

            ChallengeEvent::VerifyRequested => match &self.state {
                ChallengeState::AwaitingCode {
                    identifier, code, ..
                } => {
                    if code.is_empty() {
                        return Err(ChallengeError::InvalidFormat(
                            "Please enter the verification code".to_string(),
                        ));
                    }
                    if !code.is_complete() {
                        return Err(ChallengeError::InvalidFormat(
                            "Please enter the 6-digit verification code".to_string(),
                        ));
                    }
                    Ok(Some(ChallengeCommand::VerifyCode {
                        identifier: identifier.clone(),
                        code: code.as_str().to_string(),
                    }))
                }
                ChallengeState::Locked { ledger, .. } => Err(ChallengeError::VerifyExhausted {
                    max: ledger.max_verify_attempts(),
                }),
                _ => Err(self.invalid("verify")),
            },

            ChallengeEvent::CodeAccepted => match &self.state {
                ChallengeState::AwaitingCode {
                    identifier, ledger, ..
                } => {
                    self.state = ChallengeState::Verified {
                        identifier: identifier.clone(),
                        ledger: *ledger,
                    };
                    Ok(Some(ChallengeCommand::StopCooldown))
                }
                _ => Err(self.invalid("accept a code")),
            },

            ChallengeEvent::CodeRejected => {
                let (identifier, mut ledger) = match &self.state {
                    ChallengeState::AwaitingCode {
                        identifier, ledger, ..
                    } => (identifier.clone(), *ledger),
                    _ => return Err(self.invalid("reject a code")),
                };

                match ledger.record_verify_failure() {
                    VerifyFailure::Remaining(remaining) => {
                        if let ChallengeState::AwaitingCode { ledger: current, .. } =
                            &mut self.state
                        {
                            *current = ledger;
                        }
                        Err(ChallengeError::InvalidCode { remaining })
                    }
                    VerifyFailure::Exhausted => {
                        let max = ledger.max_verify_attempts();
                        self.state = ChallengeState::Locked { identifier, ledger };
                        Err(ChallengeError::VerifyExhausted { max })
                    }
                }
            }

            ChallengeEvent::ResendRequested { cooldown_remaining } => match &self.state {
                ChallengeState::AwaitingCode {
                    identifier, ledger, ..
                }
                | ChallengeState::Locked { identifier, ledger } => {
                    if ledger.resend_exhausted() {
                        return Err(ChallengeError::ResendExhausted {
                            max: ledger.max_resend_attempts(),
                        });
                    }
                    if *cooldown_remaining > 0 {
                        return Err(ChallengeError::ResendCooldown {
                            remaining: *cooldown_remaining,
                        });
                    }
                    Ok(Some(ChallengeCommand::ResendCode {
                        identifier: identifier.clone(),
                    }))
                }
                _ => Err(self.invalid("resend a code")),
            },

            ChallengeEvent::CodeResent => {
                let (identifier, mut ledger) = match &self.state {
                    ChallengeState::AwaitingCode {
                        identifier, ledger, ..
                    }
                    | ChallengeState::Locked { identifier, ledger } => (identifier.clone(), *ledger),
                    _ => return Err(self.invalid("accept a resend")),
                };

                ledger
                    .record_resend()
                    .map_err(|_| ChallengeError::ResendExhausted {
                        max: ledger.max_resend_attempts(),
                    })?;
                ledger.reset_verify();

                self.state = ChallengeState::AwaitingCode {
                    identifier,
                    ledger,
                    code: EnteredCode::default(),
                };
                Ok(Some(ChallengeCommand::StartCooldown))
            }

            ChallengeEvent::Reset => {
                self.state = ChallengeState::Idle;
                Ok(Some(ChallengeCommand::StopCooldown))
            }
        }
    }

    fn invalid(&self, action: &'static str) -> ChallengeError {
        ChallengeError::InvalidState {
            action,
            status: self.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> Identifier {
        Identifier::parse("+94771234567").unwrap()
    }

    fn awaiting() -> ChallengeMachine {
        let mut machine = ChallengeMachine::new(ThrottleConfig::default());
        machine.decide(&ChallengeEvent::Submit(phone())).unwrap();
        machine
            .decide(&ChallengeEvent::CodeDelivered(phone()))
            .unwrap();
        machine
    }

    #[test]
    fn test_submit_asks_for_delivery_without_leaving_idle() {
        let mut machine = ChallengeMachine::new(ThrottleConfig::default());
        let cmd = machine.decide(&ChallengeEvent::Submit(phone())).unwrap();
        assert_eq!(cmd, Some(ChallengeCommand::SendCode { identifier: phone() }));
        assert_eq!(machine.status(), ChallengeStatus::Idle);
    }

    #[test]
    fn test_delivery_starts_cooldown() {
        let mut machine = ChallengeMachine::new(ThrottleConfig::default());
        let cmd = machine
            .decide(&ChallengeEvent::CodeDelivered(phone()))
            .unwrap();
        assert_eq!(cmd, Some(ChallengeCommand::StartCooldown));
        assert_eq!(machine.status(), ChallengeStatus::AwaitingCode);
        assert_eq!(machine.state().identifier(), Some(&phone()));
        assert_eq!(machine.verify_attempts(), 0);
        assert_eq!(machine.resend_count(), 0);
    }

    #[test]
    fn test_verify_requires_full_code() {
        let mut machine = awaiting();
        let err = machine.decide(&ChallengeEvent::VerifyRequested).unwrap_err();
        assert_eq!(
            err,
            ChallengeError::InvalidFormat("Please enter the verification code".to_string())
        );

        machine
            .decide(&ChallengeEvent::CodeEntered("123".to_string()))
            .unwrap();
        assert!(!machine.can_verify());
        assert!(matches!(
            machine.decide(&ChallengeEvent::VerifyRequested),
            Err(ChallengeError::InvalidFormat(_))
        ));
        assert_eq!(machine.verify_attempts(), 0);
    }

    #[test]
    fn test_verify_emits_normalized_code() {
        let mut machine = awaiting();
        machine
            .decide(&ChallengeEvent::CodeEntered("12 34 56 78".to_string()))
            .unwrap();
        assert_eq!(machine.entered_code(), "123456");

        let cmd = machine.decide(&ChallengeEvent::VerifyRequested).unwrap();
        assert_eq!(
            cmd,
            Some(ChallengeCommand::VerifyCode {
                identifier: phone(),
                code: "123456".to_string(),
            })
        );
    }

    #[test]
    fn test_rejections_lock_at_ceiling() {
        let mut machine = awaiting();

        assert_eq!(
            machine.decide(&ChallengeEvent::CodeRejected),
            Err(ChallengeError::InvalidCode { remaining: 2 })
        );
        assert_eq!(
            machine.decide(&ChallengeEvent::CodeRejected),
            Err(ChallengeError::InvalidCode { remaining: 1 })
        );
        assert_eq!(machine.status(), ChallengeStatus::AwaitingCode);

        assert_eq!(
            machine.decide(&ChallengeEvent::CodeRejected),
            Err(ChallengeError::VerifyExhausted { max: 3 })
        );
        assert_eq!(machine.status(), ChallengeStatus::Locked);
        assert_eq!(machine.verify_attempts(), 3);

        // Locked: no verify command, no further counting
        assert_eq!(
            machine.decide(&ChallengeEvent::VerifyRequested),
            Err(ChallengeError::VerifyExhausted { max: 3 })
        );
        assert!(matches!(
            machine.decide(&ChallengeEvent::CodeRejected),
            Err(ChallengeError::InvalidState { .. })
        ));
        assert_eq!(machine.verify_attempts(), 3);
    }

    #[test]
    fn test_resend_blocked_during_cooldown() {
        let mut machine = awaiting();
        assert_eq!(
            machine.decide(&ChallengeEvent::ResendRequested {
                cooldown_remaining: 42
            }),
            Err(ChallengeError::ResendCooldown { remaining: 42 })
        );
    }

    #[test]
    fn test_resend_from_locked_unlocks() {
        let mut machine = awaiting();
        for _ in 0..3 {
            let _ = machine.decide(&ChallengeEvent::CodeRejected);
        }
        assert_eq!(machine.status(), ChallengeStatus::Locked);

        let cmd = machine
            .decide(&ChallengeEvent::ResendRequested {
                cooldown_remaining: 0,
            })
            .unwrap();
        assert_eq!(cmd, Some(ChallengeCommand::ResendCode { identifier: phone() }));

        let cmd = machine.decide(&ChallengeEvent::CodeResent).unwrap();
        assert_eq!(cmd, Some(ChallengeCommand::StartCooldown));
        assert_eq!(machine.status(), ChallengeStatus::AwaitingCode);
        assert_eq!(machine.verify_attempts(), 0);
        assert_eq!(machine.resend_count(), 1);
    }

    #[test]
    fn test_resend_clears_entered_code() {
        let mut machine = awaiting();
        machine
            .decide(&ChallengeEvent::CodeEntered("654321".to_string()))
            .unwrap();
        let _ = machine.decide(&ChallengeEvent::CodeRejected);

        machine.decide(&ChallengeEvent::CodeResent).unwrap();
        assert_eq!(machine.entered_code(), "");
        assert_eq!(machine.verify_attempts(), 0);
    }

    #[test]
    fn test_resend_exhausted_is_terminal() {
        let mut machine = awaiting();
        for _ in 0..3 {
            machine
                .decide(&ChallengeEvent::ResendRequested {
                    cooldown_remaining: 0,
                })
                .unwrap();
            machine.decide(&ChallengeEvent::CodeResent).unwrap();
        }
        assert_eq!(machine.resend_count(), 3);
        assert!(!machine.resend_available());

        // Exhaustion wins over cooldown
        assert_eq!(
            machine.decide(&ChallengeEvent::ResendRequested {
                cooldown_remaining: 10
            }),
            Err(ChallengeError::ResendExhausted { max: 3 })
        );
        assert_eq!(
            machine.decide(&ChallengeEvent::CodeResent),
            Err(ChallengeError::ResendExhausted { max: 3 })
        );
        assert_eq!(machine.resend_count(), 3);
    }

    #[test]
    fn test_accept_verifies_and_stops_cooldown() {
        let mut machine = awaiting();
        let cmd = machine.decide(&ChallengeEvent::CodeAccepted).unwrap();
        assert_eq!(cmd, Some(ChallengeCommand::StopCooldown));
        assert_eq!(machine.status(), ChallengeStatus::Verified);
        assert!(!machine.resend_available());
        assert!(matches!(
            machine.decide(&ChallengeEvent::VerifyRequested),
            Err(ChallengeError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut machine = awaiting();
        let _ = machine.decide(&ChallengeEvent::CodeRejected);
        machine.decide(&ChallengeEvent::CodeResent).unwrap();

        let cmd = machine.decide(&ChallengeEvent::Reset).unwrap();
        assert_eq!(cmd, Some(ChallengeCommand::StopCooldown));
        assert_eq!(machine.status(), ChallengeStatus::Idle);
        assert_eq!(machine.verify_attempts(), 0);
        assert_eq!(machine.resend_count(), 0);
        assert_eq!(machine.state().identifier(), None);
    }

    #[test]
    fn test_second_submit_rejected_until_reset() {
        let mut machine = awaiting();
        assert!(matches!(
            machine.decide(&ChallengeEvent::Submit(phone())),
            Err(ChallengeError::InvalidState {
                status: ChallengeStatus::AwaitingCode,
                ..
            })
        ));
    }

    #[test]
    fn test_typing_while_locked_is_refused() {
        let mut machine = awaiting();
        for _ in 0..3 {
            let _ = machine.decide(&ChallengeEvent::CodeRejected);
        }
        assert_eq!(
            machine.decide(&ChallengeEvent::CodeEntered("1".to_string())),
            Err(ChallengeError::VerifyExhausted { max: 3 })
        );
    }
}
