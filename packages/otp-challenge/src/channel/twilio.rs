// TwilioService adapter (implements OtpChannel)

use std::sync::Arc;

use async_trait::async_trait;
use twilio::models::VerificationStatus;
use twilio::{TwilioError, TwilioService};

use super::{ChannelError, Delivery, OtpChannel, Verification};
use crate::identifier::Identifier;

/// Wrapper around TwilioService that implements OtpChannel
#[derive(Debug, Clone)]
pub struct TwilioChannel(pub Arc<TwilioService>);

impl TwilioChannel {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

impl From<TwilioError> for ChannelError {
    fn from(err: TwilioError) -> Self {
        match err {
            TwilioError::RateLimited(message) => ChannelError::RateLimited(message),
            other => ChannelError::Transport(other.message()),
        }
    }
}

/// Failure of a verification check.
///
/// Twilio drops the pending verification once its own attempt limit is hit
/// or the code expires, and answers the check with 404. The submitted code
/// can't be right.
fn check_failure(err: TwilioError) -> ChannelError {
    match err {
        TwilioError::NotFound(_) => ChannelError::InvalidCode,
        other => other.into(),
    }
}

#[async_trait]
impl OtpChannel for TwilioChannel {
    async fn send_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        let response = self.0.send_otp(identifier.as_str()).await?;
        Ok(Delivery {
            accepted: response.status == VerificationStatus::Pending,
        })
    }

    async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Verification, ChannelError> {
        let response = self
            .0
            .verify_otp(identifier.as_str(), code)
            .await
            .map_err(check_failure)?;
        Ok(Verification {
            valid: response.is_approved(),
        })
    }
}
