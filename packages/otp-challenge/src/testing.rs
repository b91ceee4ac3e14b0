// Recording channel for tests
//
// Scripted outcomes are consumed in order; once a script runs dry the mock
// falls back to accepting deliveries and rejecting codes other than the
// configured valid code.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::channel::{ChannelError, Delivery, OtpChannel, Verification};
use crate::identifier::Identifier;

/// A call the mock observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCall {
    Send(Identifier),
    Verify(Identifier, String),
    Resend(Identifier),
}

#[derive(Default)]
struct Inner {
    calls: Vec<ChannelCall>,
    deliveries: VecDeque<Result<Delivery, ChannelError>>,
    verifications: VecDeque<Result<Verification, ChannelError>>,
}

#[derive(Clone)]
pub struct MockChannel {
    valid_code: String,
    inner: Arc<Mutex<Inner>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::with_valid_code("123456")
    }

    pub fn with_valid_code(code: &str) -> Self {
        Self {
            valid_code: code.to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Queue the outcome of the next send or resend
    pub fn with_delivery(self, outcome: Result<Delivery, ChannelError>) -> Self {
        self.inner.lock().unwrap().deliveries.push_back(outcome);
        self
    }

    /// Queue the outcome of the next verify
    pub fn with_verification(self, outcome: Result<Verification, ChannelError>) -> Self {
        self.inner.lock().unwrap().verifications.push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    pub fn verify_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChannelCall::Verify(..)))
            .count()
    }

    pub fn resend_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChannelCall::Resend(..)))
            .count()
    }

    fn next_delivery(&self, call: ChannelCall) -> Result<Delivery, ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        inner
            .deliveries
            .pop_front()
            .unwrap_or(Ok(Delivery { accepted: true }))
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpChannel for MockChannel {
    async fn send_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        self.next_delivery(ChannelCall::Send(identifier.clone()))
    }

    async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Verification, ChannelError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push(ChannelCall::Verify(identifier.clone(), code.to_string()));
        inner.verifications.pop_front().unwrap_or(Ok(Verification {
            valid: code == self.valid_code,
        }))
    }

    async fn resend_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        self.next_delivery(ChannelCall::Resend(identifier.clone()))
    }
}
