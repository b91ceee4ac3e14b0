//! Login/signup modal behavior across the phone and email challenges.

use std::sync::Arc;
use std::time::Duration;

use otp_challenge::testing::MockChannel;
use otp_challenge::{
    AuthFlow, AuthMode, ChallengeStatus, Identifier, OtpChannel, SimulatedChannel,
    ThrottleConfig,
};

fn flow(phone: &MockChannel, email: &MockChannel) -> AuthFlow<MockChannel, MockChannel> {
    AuthFlow::new(phone.clone(), email.clone(), ThrottleConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_channels_are_independent() {
    let phone = MockChannel::new();
    let email = MockChannel::new();
    let mut flow = flow(&phone, &email);

    flow.phone_mut().request_code("+94771234567").await.unwrap();
    let _ = flow.phone_mut().submit_code("000000").await;
    flow.email_mut().request_code("jane@example.com").await.unwrap();

    assert_eq!(flow.phone().verify_attempts(), 1);
    assert_eq!(flow.email().verify_attempts(), 0);
    assert_eq!(flow.email().status(), ChallengeStatus::AwaitingCode);
    assert_eq!(phone.call_count(), 2);
    assert_eq!(email.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_switching_mode_resets_both_challenges() {
    let phone = MockChannel::new();
    let email = MockChannel::new();
    let mut flow = flow(&phone, &email);
    flow.phone_mut().request_code("+94771234567").await.unwrap();
    flow.email_mut().request_code("jane@example.com").await.unwrap();

    flow.switch_mode(AuthMode::Signup);

    assert_eq!(flow.mode(), AuthMode::Signup);
    assert_eq!(flow.phone().status(), ChallengeStatus::Idle);
    assert_eq!(flow.email().status(), ChallengeStatus::Idle);
    assert_eq!(flow.phone().countdown().remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_switching_to_same_mode_keeps_progress() {
    let phone = MockChannel::new();
    let email = MockChannel::new();
    let mut flow = flow(&phone, &email);
    flow.phone_mut().request_code("+94771234567").await.unwrap();

    flow.switch_mode(AuthMode::Login);

    assert_eq!(flow.phone().status(), ChallengeStatus::AwaitingCode);
}

#[tokio::test(start_paused = true)]
async fn test_close_discards_challenges() {
    let phone = MockChannel::new();
    let email = MockChannel::new();
    let mut flow = flow(&phone, &email);
    flow.email_mut().request_code("jane@example.com").await.unwrap();

    flow.close();

    assert_eq!(flow.email().status(), ChallengeStatus::Idle);
    assert!(flow.email().resend_available_at().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_complete_reports_verified_identifier_and_resets() {
    let phone = MockChannel::new();
    let email = MockChannel::new();
    let mut flow = flow(&phone, &email);
    flow.switch_mode(AuthMode::Signup);
    flow.email_mut().request_code("Jane@Example.com").await.unwrap();

    assert!(flow.complete().is_none());

    flow.email_mut().submit_code("123456").await.unwrap();
    let (mode, identifier) = flow.complete().unwrap();

    assert_eq!(mode, AuthMode::Signup);
    assert_eq!(identifier, Identifier::parse("jane@example.com").unwrap());
    assert_eq!(flow.email().status(), ChallengeStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_shared_simulated_channel_end_to_end() {
    let channel = Arc::new(SimulatedChannel::seeded(11));
    let mut flow = AuthFlow::new(
        Arc::clone(&channel),
        Arc::clone(&channel),
        ThrottleConfig::default(),
    );

    flow.phone_mut().request_code("+94771234567").await.unwrap();
    let target = Identifier::parse("+94771234567").unwrap();
    let first = channel.issued_code(&target).unwrap();

    tokio::time::sleep(Duration::from_millis(60_500)).await;
    flow.phone_mut().resend().await.unwrap();
    let code = channel.issued_code(&target).unwrap();
    assert_eq!(code.len(), first.len());

    flow.phone_mut().submit_code(&code).await.unwrap();
    assert_eq!(flow.verified_identifier(), Some(&target));

    // Codes are single-use
    assert!(channel.verify_code(&target, &code).await.is_err());
}
