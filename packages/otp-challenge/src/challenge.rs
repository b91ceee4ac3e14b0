//! Challenge effect layer: runs the machine's commands against a channel.

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::{ChannelError, OtpChannel, Verification};
use crate::config::ThrottleConfig;
use crate::error::ChallengeError;
use crate::identifier::{ChannelKind, Identifier};
use crate::machine::{ChallengeCommand, ChallengeEvent, ChallengeMachine, ChallengeStatus};
use crate::ticker::{Countdown, ResendTicker};

/// One OTP challenge for one channel kind.
///
/// Owns its machine, its cooldown ticker and its channel. Every operation that
/// talks to the channel takes `&mut self`, so a reset can never interleave with
/// an in-flight call; dropping the challenge drops the future and the ticker.
pub struct OtpChallenge<C> {
    id: Uuid,
    kind: ChannelKind,
    channel: C,
    machine: ChallengeMachine,
    ticker: ResendTicker,
}

impl<C: OtpChannel> OtpChallenge<C> {
    pub fn new(kind: ChannelKind, channel: C, config: ThrottleConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            channel,
            ticker: ResendTicker::new(config.resend_cooldown_secs),
            machine: ChallengeMachine::new(config),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn machine(&self) -> &ChallengeMachine {
        &self.machine
    }

    pub fn status(&self) -> ChallengeStatus {
        self.machine.status()
    }

    pub fn identifier(&self) -> Option<&Identifier> {
        self.machine.state().identifier()
    }

    pub fn verify_attempts(&self) -> u32 {
        self.machine.verify_attempts()
    }

    pub fn resend_count(&self) -> u32 {
        self.machine.resend_count()
    }

    pub fn remaining_verify_attempts(&self) -> u32 {
        self.machine
            .state()
            .ledger()
            .map_or(self.machine.config().max_verify_attempts, |ledger| {
                ledger.remaining_verify_attempts()
            })
    }

    pub fn entered_code(&self) -> &str {
        self.machine.entered_code()
    }

    pub fn can_verify(&self) -> bool {
        self.machine.can_verify()
    }

    /// Resend control enabled: ceiling not reached and cooldown elapsed
    pub fn can_resend(&self) -> bool {
        self.machine.resend_available() && self.ticker.can_resend()
    }

    pub fn countdown(&self) -> Countdown {
        self.ticker.countdown()
    }

    pub fn subscribe_countdown(&self) -> watch::Receiver<Countdown> {
        self.ticker.subscribe()
    }

    /// Earliest instant a resend is allowed
    pub fn resend_available_at(&self) -> Option<Instant> {
        self.ticker.available_at()
    }

    /// Validate the identifier and ask the channel to deliver a code.
    ///
    /// A different identifier than the active one resets the challenge first.
    pub async fn request_code(&mut self, input: &str) -> Result<(), ChallengeError> {
        let identifier = Identifier::parse_as(self.kind, input)?;

        if self.identifier().is_some_and(|current| *current != identifier) {
            self.reset();
        }

        let cmd = self.machine.decide(&ChallengeEvent::Submit(identifier))?;
        self.run(cmd).await
    }

    /// Update the code field. Input is normalized, not rejected.
    pub fn enter_code(&mut self, input: &str) -> Result<(), ChallengeError> {
        let cmd = self
            .machine
            .decide(&ChallengeEvent::CodeEntered(input.to_string()))?;
        self.run_local(cmd);
        Ok(())
    }

    /// Verify the code currently entered.
    pub async fn verify(&mut self) -> Result<(), ChallengeError> {
        let cmd = self.machine.decide(&ChallengeEvent::VerifyRequested)?;
        self.run(cmd).await
    }

    /// Enter and verify in one step.
    pub async fn submit_code(&mut self, input: &str) -> Result<(), ChallengeError> {
        self.enter_code(input)?;
        self.verify().await
    }

    /// Ask for a fresh code. Rejected locally during the cooldown and once the
    /// resend ceiling is reached.
    pub async fn resend(&mut self) -> Result<(), ChallengeError> {
        let event = ChallengeEvent::ResendRequested {
            cooldown_remaining: self.ticker.remaining(),
        };
        let cmd = self.machine.decide(&event).inspect_err(|err| {
            debug!(challenge_id = %self.id, error = %err, "resend refused locally");
        })?;
        self.run(cmd).await
    }

    /// The identifier field was edited. Resets unless it still matches.
    pub fn identifier_edited(&mut self, input: &str) {
        let unchanged = match (self.identifier(), Identifier::parse_as(self.kind, input)) {
            (Some(current), Ok(edited)) => *current == edited,
            (None, _) => true,
            (Some(_), Err(_)) => false,
        };
        if !unchanged {
            self.reset();
        }
    }

    /// Back to idle with both counters zeroed and the ticker stopped.
    pub fn reset(&mut self) {
        if self.status() != ChallengeStatus::Idle {
            info!(challenge_id = %self.id, channel = %self.kind, "challenge reset");
        }
        // Reset is accepted from every state
        if let Ok(cmd) = self.machine.decide(&ChallengeEvent::Reset) {
            self.run_local(cmd);
        }
    }

    async fn run(&mut self, mut next: Option<ChallengeCommand>) -> Result<(), ChallengeError> {
        while let Some(cmd) = next.take() {
            next = match cmd {
                ChallengeCommand::SendCode { identifier } => {
                    let delivery = self
                        .channel
                        .send_code(&identifier)
                        .await
                        .map_err(|err| self.transport_failure("send", err))?;
                    if !delivery.accepted {
                        warn!(challenge_id = %self.id, recipient = %identifier.masked(), "delivery not accepted");
                        return Err(ChallengeError::TransportError(
                            "Failed to send verification code".to_string(),
                        ));
                    }
                    info!(challenge_id = %self.id, recipient = %identifier.masked(), "verification code sent");
                    self.machine
                        .decide(&ChallengeEvent::CodeDelivered(identifier))?
                }

                ChallengeCommand::VerifyCode { identifier, code } => {
                    match self.channel.verify_code(&identifier, &code).await {
                        Ok(Verification { valid: true }) => {
                            info!(challenge_id = %self.id, recipient = %identifier.masked(), "code verified");
                            self.machine.decide(&ChallengeEvent::CodeAccepted)?
                        }
                        Ok(Verification { valid: false }) | Err(ChannelError::InvalidCode) => {
                            let result = self.machine.decide(&ChallengeEvent::CodeRejected);
                            if self.status() == ChallengeStatus::Locked {
                                warn!(
                                    challenge_id = %self.id,
                                    recipient = %identifier.masked(),
                                    attempts = self.verify_attempts(),
                                    "verify attempts exhausted, challenge locked"
                                );
                            } else {
                                info!(
                                    challenge_id = %self.id,
                                    attempts = self.verify_attempts(),
                                    "wrong verification code"
                                );
                            }
                            result?
                        }
                        Err(err) => return Err(self.transport_failure("verify", err)),
                    }
                }

                ChallengeCommand::ResendCode { identifier } => {
                    let delivery = self
                        .channel
                        .resend_code(&identifier)
                        .await
                        .map_err(|err| self.transport_failure("resend", err))?;
                    if !delivery.accepted {
                        return Err(ChallengeError::TransportError(
                            "Failed to resend verification code".to_string(),
                        ));
                    }
                    let cmd = self.machine.decide(&ChallengeEvent::CodeResent)?;
                    info!(
                        challenge_id = %self.id,
                        recipient = %identifier.masked(),
                        resend_count = self.resend_count(),
                        "verification code resent"
                    );
                    cmd
                }

                local => {
                    self.run_local(Some(local));
                    None
                }
            };
        }
        Ok(())
    }

    fn run_local(&mut self, cmd: Option<ChallengeCommand>) {
        match cmd {
            Some(ChallengeCommand::StartCooldown) => self.ticker.start(),
            Some(ChallengeCommand::StopCooldown) => self.ticker.cancel(),
            Some(other) => {
                warn!(challenge_id = %self.id, command = ?other, "unexpected command outside a channel call")
            }
            None => {}
        }
    }

    fn transport_failure(&self, operation: &'static str, err: ChannelError) -> ChallengeError {
        warn!(challenge_id = %self.id, operation, error = %err, "channel call failed");
        err.into()
    }
}
