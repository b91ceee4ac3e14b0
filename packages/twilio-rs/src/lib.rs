// Twilio Verify v2 client: start a verification and check a submitted code.

pub mod models;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{OTPResponse, OTPVerifyResponse, TwilioErrorBody};

const DEFAULT_BASE_URL: &str = "https://verify.twilio.com/v2";

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub service_id: String,
}

#[derive(Debug, Error)]
pub enum TwilioError {
    /// 404. On a check this means no pending verification for the recipient
    /// (expired, already approved, or Twilio's own attempt limit was hit); on
    /// a start it means the service SID does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Twilio returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request to Twilio failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl TwilioError {
    /// Text Twilio sent with the failure, without the status prefix
    pub fn message(&self) -> String {
        match self {
            TwilioError::NotFound(message)
            | TwilioError::RateLimited(message)
            | TwilioError::Api { message, .. } => message.clone(),
            TwilioError::Http(err) => err.to_string(),
        }
    }
}

/// Map a non-success Twilio response onto a typed error, keeping Twilio's
/// message (or the raw body when it isn't JSON).
pub fn classify_error(status: StatusCode, body: &str) -> TwilioError {
    let message = serde_json::from_str::<TwilioErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                format!("Twilio request failed with status {}", status.as_u16())
            } else {
                raw.to_string()
            }
        });

    match status {
        StatusCode::NOT_FOUND => TwilioError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => TwilioError::RateLimited(message),
        _ => TwilioError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Delivery channel Twilio should use for a recipient
pub fn channel_for(recipient: &str) -> &'static str {
    if recipient.contains('@') {
        "email"
    } else {
        "sms"
    }
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    base_url: String,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different Verify host (proxies, local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn service_url(&self, resource: &str) -> String {
        format!(
            "{}/Services/{}/{}",
            self.base_url, self.options.service_id, resource
        )
    }

    pub async fn send_otp(&self, recipient: &str) -> Result<OTPResponse, TwilioError> {
        let channel = channel_for(recipient);
        let form = [("To", recipient), ("Channel", channel)];

        let response = self
            .client
            .post(self.service_url("Verifications"))
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Twilio rejected verification start");
            return Err(classify_error(status, &body));
        }

        let data = response.json::<OTPResponse>().await?;
        debug!(sid = %data.sid, channel = %data.channel, "Twilio verification started");
        Ok(data)
    }

    pub async fn verify_otp(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<OTPVerifyResponse, TwilioError> {
        let form = [("To", recipient), ("Code", code)];

        let response = self
            .client
            .post(self.service_url("VerificationCheck"))
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Twilio rejected verification check");
            return Err(classify_error(status, &body));
        }

        Ok(response.json::<OTPVerifyResponse>().await?)
    }
}
