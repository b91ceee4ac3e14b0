// msgly backend OTP endpoints (`/otp/send`, `/otp/verify`, `/otp/resend`)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChannelError, Delivery, OtpChannel, Verification};
use crate::identifier::{ChannelKind, Identifier};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    identifier: &'a str,
    channel: ChannelKind,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    identifier: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    accepted: bool,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a non-success backend response onto a channel error.
///
/// The backend flags a wrong code with `"code": "invalid_code"`; every other
/// failure keeps its message so the form can show it verbatim.
fn classify_failure(status: StatusCode, body: &str) -> ChannelError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let wrong_code = parsed.code.as_deref() == Some("invalid_code")
        && matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
        );
    if wrong_code {
        return ChannelError::InvalidCode;
    }

    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                format!("Request failed with status {}", status.as_u16())
            } else {
                raw.to_string()
            }
        });

    if status == StatusCode::TOO_MANY_REQUESTS {
        ChannelError::RateLimited(message)
    } else {
        ChannelError::Transport(message)
    }
}

#[derive(Debug, Clone)]
pub struct BackendChannel {
    base_url: String,
    client: Client,
}

impl BackendChannel {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/otp/{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ChannelError>
    where
        B: Serialize + ?Sized + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, status = %status, "backend rejected OTP request");
            return Err(classify_failure(status, &body));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ChannelError::Transport(format!("Unexpected response from server: {e}")))
    }

    async fn deliver(&self, path: &str, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        let request = SendRequest {
            identifier: identifier.as_str(),
            channel: identifier.kind(),
        };
        let response: SendResponse = self.post(path, &request).await?;
        debug!(
            path,
            recipient = %identifier.masked(),
            accepted = response.accepted,
            "backend delivery"
        );
        Ok(Delivery {
            accepted: response.accepted,
        })
    }
}

#[async_trait]
impl OtpChannel for BackendChannel {
    async fn send_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        self.deliver("send", identifier).await
    }

    async fn verify_code(
        &self,
        identifier: &Identifier,
        code: &str,
    ) -> Result<Verification, ChannelError> {
        let request = VerifyRequest {
            identifier: identifier.as_str(),
            code,
        };
        let response: VerifyResponse = self.post("verify", &request).await?;
        Ok(Verification {
            valid: response.valid,
        })
    }

    async fn resend_code(&self, identifier: &Identifier) -> Result<Delivery, ChannelError> {
        self.deliver("resend", identifier).await
    }
}
