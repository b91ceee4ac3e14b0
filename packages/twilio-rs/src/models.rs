use serde::Deserialize;

/// Verification status as reported by Twilio Verify v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Response to `POST /Services/{sid}/Verifications`
#[derive(Debug, Clone, Deserialize)]
pub struct OTPResponse {
    pub sid: String,
    pub to: String,
    pub channel: String,
    pub status: VerificationStatus,
}

/// Response to `POST /Services/{sid}/VerificationCheck`
#[derive(Debug, Clone, Deserialize)]
pub struct OTPVerifyResponse {
    pub status: VerificationStatus,
    #[serde(default)]
    pub valid: bool,
}

impl OTPVerifyResponse {
    pub fn is_approved(&self) -> bool {
        self.status == VerificationStatus::Approved
    }
}

/// Error body Twilio returns with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}
