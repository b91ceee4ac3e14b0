//! In-process channel for demos and local development.
//!
//! Codes are generated here and written to the log instead of being sent.
//! Delivery fails at a configurable rate, like the dashboard's mocked routes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ChannelError, Delivery, OtpChannel, Verification};
use crate::identifier::Identifier;

pub struct SimulatedChannel {
    success_rate: f64,
    rng: Mutex<fastrand::Rng>,
    issued: Mutex<HashMap<Identifier, String>>,
}

impl SimulatedChannel {
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Deterministic codes, for tests and reproducible demos
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            success_rate: 1.0,
            rng: Mutex::new(rng),
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Fraction of deliveries that succeed, clamped to `0.0..=1.0`
    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// The code most recently issued to the identifier
    pub fn issued_code(&self, identifier: &Identifier) -> Option<String> {
        self.issued
            .lock()
            .ok()
            .and_then(|issued| issued.get(identifier).cloned())
    }

    fn issued(&self) -> Result<MutexGuard<'_, HashMap<Identifier, String>>, ChannelError> {
        self.issued.lock().map_err(|_| poisoned())
    }

    fn issue(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| poisoned())?;

        if rng.f64() >= self.success_rate {
            warn!(recipient = %identifier.masked(), "simulated delivery failure");
            return Err(ChannelError::Transport(
                "Failed to send verification code".to_string(),
            ));
        }

        let code = format!("{:06}", rng.u32(0..1_000_000));
        drop(rng);

        info!(
            recipient = %identifier.masked(),
            channel = %identifier.kind(),
            code = %code,
            "simulated code delivered"
        );
        self.issued()?.insert(identifier.clone(), code);

        Ok(Delivery { accepted: true })
    }
}

fn poisoned() -> ChannelError {
    ChannelError::Transport("simulator state poisoned".to_string())
}

impl Default for SimulatedChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpChannel for SimulatedChannel {
    async fn send_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        self.issue(identifier)
    }

    async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Verification, ChannelError> {
        let mut issued = self.issued()?;
        match issued.get(identifier).map(|expected| expected == code) {
            Some(true) => {
                issued.remove(identifier);
                Ok(Verification { valid: true })
            }
            Some(false) => Ok(Verification { valid: false }),
            None => Err(ChannelError::Transport(
                "No verification code was requested for this identifier".to_string(),
            )),
        }
    }
}
