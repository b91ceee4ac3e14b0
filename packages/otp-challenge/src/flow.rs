//! Sign-in / sign-up modal: one phone challenge and one email challenge.

use std::fmt;

use tracing::info;

use crate::challenge::OtpChallenge;
use crate::channel::OtpChannel;
use crate::config::ThrottleConfig;
use crate::identifier::{ChannelKind, Identifier};
use crate::machine::ChallengeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Login => write!(f, "login"),
            AuthMode::Signup => write!(f, "signup"),
        }
    }
}

/// Both channels, independent of each other, sharing only the auth mode.
pub struct AuthFlow<P, E> {
    mode: AuthMode,
    phone: OtpChallenge<P>,
    email: OtpChallenge<E>,
}

impl<P: OtpChannel, E: OtpChannel> AuthFlow<P, E> {
    pub fn new(phone_channel: P, email_channel: E, config: ThrottleConfig) -> Self {
        Self {
            mode: AuthMode::default(),
            phone: OtpChallenge::new(ChannelKind::Phone, phone_channel, config),
            email: OtpChallenge::new(ChannelKind::Email, email_channel, config),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn phone(&self) -> &OtpChallenge<P> {
        &self.phone
    }

    pub fn phone_mut(&mut self) -> &mut OtpChallenge<P> {
        &mut self.phone
    }

    pub fn email(&self) -> &OtpChallenge<E> {
        &self.email
    }

    pub fn email_mut(&mut self) -> &mut OtpChallenge<E> {
        &mut self.email
    }

    /// Switching between login and signup discards both challenges.
    pub fn switch_mode(&mut self, mode: AuthMode) {
        if mode == self.mode {
            return;
        }
        info!(from = %self.mode, to = %mode, "auth mode switched");
        self.mode = mode;
        self.reset_all();
    }

    /// Modal closed.
    pub fn close(&mut self) {
        self.reset_all();
    }

    /// The identifier that completed verification, if any.
    pub fn verified_identifier(&self) -> Option<&Identifier> {
        if self.phone.status() == ChallengeStatus::Verified {
            self.phone.identifier()
        } else if self.email.status() == ChallengeStatus::Verified {
            self.email.identifier()
        } else {
            None
        }
    }

    /// Hand off a successful login and discard both challenges.
    pub fn complete(&mut self) -> Option<(AuthMode, Identifier)> {
        let identifier = self.verified_identifier()?.clone();
        info!(mode = %self.mode, channel = %identifier.kind(), "authentication completed");
        self.reset_all();
        Some((self.mode, identifier))
    }

    fn reset_all(&mut self) {
        self.phone.reset();
        self.email.reset();
    }
}
