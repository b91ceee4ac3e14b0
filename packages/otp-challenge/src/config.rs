use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_VERIFY_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_RESEND_ATTEMPTS: u32 = 3;
pub const DEFAULT_RESEND_COOLDOWN_SECS: u32 = 60;

/// Ceilings and cooldown applied to every challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub max_verify_attempts: u32,
    pub max_resend_attempts: u32,
    pub resend_cooldown_secs: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_verify_attempts: DEFAULT_MAX_VERIFY_ATTEMPTS,
            max_resend_attempts: DEFAULT_MAX_RESEND_ATTEMPTS,
            resend_cooldown_secs: DEFAULT_RESEND_COOLDOWN_SECS,
        }
    }
}

impl ThrottleConfig {
    /// Load overrides from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let config = Self {
            max_verify_attempts: read_u32("OTP_MAX_VERIFY_ATTEMPTS", DEFAULT_MAX_VERIFY_ATTEMPTS)?,
            max_resend_attempts: read_u32("OTP_MAX_RESEND_ATTEMPTS", DEFAULT_MAX_RESEND_ATTEMPTS)?,
            resend_cooldown_secs: read_u32(
                "OTP_RESEND_COOLDOWN_SECS",
                DEFAULT_RESEND_COOLDOWN_SECS,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_verify_attempts == 0 {
            bail!("OTP_MAX_VERIFY_ATTEMPTS must be at least 1");
        }
        if self.max_resend_attempts == 0 {
            bail!("OTP_MAX_RESEND_ATTEMPTS must be at least 1");
        }
        if self.resend_cooldown_secs == 0 {
            bail!("OTP_RESEND_COOLDOWN_SECS must be at least 1");
        }
        Ok(())
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(u64::from(self.resend_cooldown_secs))
    }
}

fn read_u32(key: &str, default: u32) -> Result<u32> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ThrottleConfig::default();
        assert_eq!(config.max_verify_attempts, 3);
        assert_eq!(config.max_resend_attempts, 3);
        assert_eq!(config.resend_cooldown(), Duration::from_secs(60));
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("OTP_MAX_VERIFY_ATTEMPTS", Some("5")),
                ("OTP_MAX_RESEND_ATTEMPTS", None),
                ("OTP_RESEND_COOLDOWN_SECS", Some("30")),
            ],
            || {
                let config = ThrottleConfig::from_env().unwrap();
                assert_eq!(config.max_verify_attempts, 5);
                assert_eq!(config.max_resend_attempts, 3);
                assert_eq!(config.resend_cooldown_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        temp_env::with_var("OTP_MAX_RESEND_ATTEMPTS", Some("many"), || {
            let err = ThrottleConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("OTP_MAX_RESEND_ATTEMPTS"));
        });
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let config = ThrottleConfig {
            max_verify_attempts: 0,
            ..ThrottleConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
