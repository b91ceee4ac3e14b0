//! # otp-challenge
//!
//! Client-side throttle for one-time-code sign-in: verify attempts, resend
//! cooldown and lockout, identical for phone and email.
//!
//! ## Layers
//!
//! ```text
//! AuthFlow (login/signup modal)
//!     ├── OtpChallenge<PhoneChannel>
//!     └── OtpChallenge<EmailChannel>
//!             ├── ChallengeMachine   decides, no IO
//!             │       └── AttemptLedger
//!             ├── ResendTicker       owned countdown task
//!             └── C: OtpChannel      send / verify / resend
//! ```
//!
//! Codes are stored and checked by the collaborator behind the channel; this
//! crate only decides when a call may be made and what its outcome means.
//!
//! ## Example
//!
//! ```ignore
//! use otp_challenge::{ChannelKind, OtpChallenge, SimulatedChannel, ThrottleConfig};
//!
//! let mut challenge = OtpChallenge::new(
//!     ChannelKind::Phone,
//!     SimulatedChannel::new(),
//!     ThrottleConfig::from_env()?,
//! );
//! challenge.request_code("+94771234567").await?;
//! match challenge.submit_code("123456").await {
//!     Ok(()) => println!("verified"),
//!     Err(err) => println!("{err}"),
//! }
//! ```

pub mod challenge;
pub mod channel;
pub mod code;
pub mod config;
pub mod error;
pub mod flow;
pub mod identifier;
pub mod ledger;
pub mod machine;
pub mod ticker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use challenge::OtpChallenge;
pub use channel::{
    BackendChannel, ChannelError, Delivery, OtpChannel, SimulatedChannel, TwilioChannel,
    Verification,
};
pub use code::{EnteredCode, CODE_LENGTH};
pub use config::ThrottleConfig;
pub use error::ChallengeError;
pub use flow::{AuthFlow, AuthMode};
pub use identifier::{ChannelKind, Identifier, IdentifierError};
pub use ledger::AttemptLedger;
pub use machine::{ChallengeCommand, ChallengeEvent, ChallengeMachine, ChallengeState, ChallengeStatus};
pub use ticker::{Countdown, ResendTicker};

// Re-export commonly used external types
pub use async_trait::async_trait;
