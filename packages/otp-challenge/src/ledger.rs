//! Attempt ledger: two independent counters with fixed ceilings.

use crate::config::ThrottleConfig;

/// Outcome of recording a failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyFailure {
    /// Attempts remain before lockout
    Remaining(u32),
    /// The ceiling was just reached
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendExhausted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptLedger {
    verify_attempts: u32,
    resend_count: u32,
    max_verify_attempts: u32,
    max_resend_attempts: u32,
}

impl AttemptLedger {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            verify_attempts: 0,
            resend_count: 0,
            max_verify_attempts: config.max_verify_attempts,
            max_resend_attempts: config.max_resend_attempts,
        }
    }

    pub fn verify_attempts(&self) -> u32 {
        self.verify_attempts
    }

    pub fn resend_count(&self) -> u32 {
        self.resend_count
    }

    pub fn max_verify_attempts(&self) -> u32 {
        self.max_verify_attempts
    }

    pub fn max_resend_attempts(&self) -> u32 {
        self.max_resend_attempts
    }

    pub fn remaining_verify_attempts(&self) -> u32 {
        self.max_verify_attempts - self.verify_attempts
    }

    pub fn verify_exhausted(&self) -> bool {
        self.verify_attempts >= self.max_verify_attempts
    }

    pub fn resend_exhausted(&self) -> bool {
        self.resend_count >= self.max_resend_attempts
    }

    pub fn record_verify_failure(&mut self) -> VerifyFailure {
        if !self.verify_exhausted() {
            self.verify_attempts += 1;
        }
        if self.verify_exhausted() {
            VerifyFailure::Exhausted
        } else {
            VerifyFailure::Remaining(self.remaining_verify_attempts())
        }
    }

    pub fn record_resend(&mut self) -> Result<u32, ResendExhausted> {
        if self.resend_exhausted() {
            return Err(ResendExhausted);
        }
        self.resend_count += 1;
        Ok(self.resend_count)
    }

    /// Clear the verify counter after a fresh code was delivered.
    pub fn reset_verify(&mut self) {
        self.verify_attempts = 0;
    }

    pub fn reset(&mut self) {
        self.verify_attempts = 0;
        self.resend_count = 0;
    }
}
