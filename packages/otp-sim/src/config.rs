use anyhow::{bail, Result};
use dotenvy::dotenv;
use std::env;

use otp_challenge::ThrottleConfig;
use twilio::TwilioOptions;

/// Simulator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Option<String>,
    pub twilio: Option<TwilioOptions>,
    pub throttle: ThrottleConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            api_url: non_empty("MSGLY_API_URL"),
            twilio: twilio_from_env()?,
            throttle: ThrottleConfig::from_env()?,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Twilio credentials are all-or-nothing.
fn twilio_from_env() -> Result<Option<TwilioOptions>> {
    let account_sid = non_empty("TWILIO_ACCOUNT_SID");
    let auth_token = non_empty("TWILIO_AUTH_TOKEN");
    let service_id = non_empty("TWILIO_VERIFY_SERVICE_SID");

    match (account_sid, auth_token, service_id) {
        (Some(account_sid), Some(auth_token), Some(service_id)) => Ok(Some(TwilioOptions {
            account_sid,
            auth_token,
            service_id,
        })),
        (None, None, None) => Ok(None),
        _ => bail!(
            "TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_VERIFY_SERVICE_SID must be set together"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWILIO_VARS: [&str; 3] = [
        "TWILIO_ACCOUNT_SID",
        "TWILIO_AUTH_TOKEN",
        "TWILIO_VERIFY_SERVICE_SID",
    ];

    #[test]
    fn test_no_twilio_credentials() {
        temp_env::with_vars_unset(TWILIO_VARS, || {
            assert!(twilio_from_env().unwrap().is_none());
        });
    }

    #[test]
    fn test_partial_twilio_credentials_rejected() {
        temp_env::with_vars(
            [
                ("TWILIO_ACCOUNT_SID", Some("AC123")),
                ("TWILIO_AUTH_TOKEN", None),
                ("TWILIO_VERIFY_SERVICE_SID", Some("VA123")),
            ],
            || {
                assert!(twilio_from_env().is_err());
            },
        );
    }

    #[test]
    fn test_full_twilio_credentials() {
        temp_env::with_vars(
            [
                ("TWILIO_ACCOUNT_SID", Some("AC123")),
                ("TWILIO_AUTH_TOKEN", Some("secret")),
                ("TWILIO_VERIFY_SERVICE_SID", Some("VA123")),
            ],
            || {
                let options = twilio_from_env().unwrap().unwrap();
                assert_eq!(options.service_id, "VA123");
            },
        );
    }

    #[test]
    fn test_blank_api_url_ignored() {
        temp_env::with_var("MSGLY_API_URL", Some("  "), || {
            assert!(non_empty("MSGLY_API_URL").is_none());
        });
    }
}
