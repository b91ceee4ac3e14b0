//! Prompt loop mirroring the sign-in modal.

use anyhow::Result;
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use otp_challenge::{
    AuthFlow, AuthMode, ChallengeError, ChallengeStatus, ChannelKind, OtpChallenge, OtpChannel,
};

enum Step {
    Identifier,
    Code(ChannelKind),
    Quit,
}

pub async fn run<C: OtpChannel>(term: &Term, flow: &mut AuthFlow<C, C>) -> Result<()> {
    let mut step = Step::Identifier;

    loop {
        step = match step {
            Step::Identifier => identifier_step(term, flow).await?,
            Step::Code(kind) => code_step(term, flow, kind).await?,
            Step::Quit => {
                flow.close();
                println!("{}", "👋 Goodbye!".bright_blue());
                return Ok(());
            }
        };
    }
}

fn challenge<C: OtpChannel>(flow: &mut AuthFlow<C, C>, kind: ChannelKind) -> &mut OtpChallenge<C> {
    match kind {
        ChannelKind::Phone => flow.phone_mut(),
        ChannelKind::Email => flow.email_mut(),
    }
}

fn other_mode(mode: AuthMode) -> AuthMode {
    match mode {
        AuthMode::Login => AuthMode::Signup,
        AuthMode::Signup => AuthMode::Login,
    }
}

async fn identifier_step<C: OtpChannel>(term: &Term, flow: &mut AuthFlow<C, C>) -> Result<Step> {
    let options = vec![
        "📱 Phone".to_string(),
        "📧 Email".to_string(),
        format!("🔁 Switch to {}", other_mode(flow.mode())),
        "🛑 Exit".to_string(),
    ];
    let selection = select(term, format!("{} with", title(flow.mode())), options).await?;

    let kind = match selection {
        0 => ChannelKind::Phone,
        1 => ChannelKind::Email,
        2 => {
            flow.switch_mode(other_mode(flow.mode()));
            return Ok(Step::Identifier);
        }
        _ => return Ok(Step::Quit),
    };

    let placeholder = match kind {
        ChannelKind::Phone => "Phone number (with country code)",
        ChannelKind::Email => "Email address",
    };
    let input = input(term, placeholder).await?;

    let challenge = challenge(flow, kind);
    challenge.identifier_edited(&input);

    println!("{}", "Sending...".dimmed());
    match challenge.request_code(&input).await {
        Ok(()) => {
            println!(
                "{} Verification code sent to {}",
                "✓".bright_green(),
                input.trim().bold()
            );
            Ok(Step::Code(kind))
        }
        Err(err) => {
            print_error(&err);
            Ok(Step::Identifier)
        }
    }
}

async fn code_step<C: OtpChannel>(
    term: &Term,
    flow: &mut AuthFlow<C, C>,
    kind: ChannelKind,
) -> Result<Step> {
    let mode = flow.mode();
    let challenge = challenge(flow, kind);
    print_status(challenge);

    let resend_label = if !challenge.machine().resend_available() {
        "🔄 Resend code (limit reached)".to_string()
    } else if challenge.can_resend() {
        "🔄 Resend code".to_string()
    } else {
        format!("🔄 Resend code (in {}s)", challenge.countdown().remaining())
    };
    let options = vec![
        "🔑 Enter code".to_string(),
        resend_label,
        "✏️  Change identifier".to_string(),
        format!("🔁 Switch to {}", other_mode(mode)),
        "🛑 Exit".to_string(),
    ];
    let selection = select(term, "What would you like to do?".to_string(), options).await?;

    match selection {
        0 => {
            if challenge.status() == ChallengeStatus::Locked {
                print_error(&ChallengeError::VerifyExhausted {
                    max: challenge.machine().config().max_verify_attempts,
                });
                return Ok(Step::Code(kind));
            }

            let input = input(term, "Verification code").await?;

            println!("{}", "Verifying...".dimmed());
            match challenge.submit_code(&input).await {
                Ok(()) => {
                    if let Some((mode, identifier)) = flow.complete() {
                        println!();
                        println!(
                            "{} {} succeeded for {}",
                            "✅".bright_green(),
                            title(mode),
                            identifier.to_string().bold()
                        );
                        println!();
                    }
                    Ok(Step::Identifier)
                }
                Err(err) => {
                    print_error(&err);
                    Ok(Step::Code(kind))
                }
            }
        }
        1 => {
            match challenge.resend().await {
                Ok(()) => println!("{} A new code is on its way", "✓".bright_green()),
                Err(err) => print_error(&err),
            }
            Ok(Step::Code(kind))
        }
        2 => {
            challenge.reset();
            Ok(Step::Identifier)
        }
        3 => {
            flow.switch_mode(other_mode(mode));
            Ok(Step::Identifier)
        }
        _ => Ok(Step::Quit),
    }
}

// Prompts block on the terminal; keep them off the runtime workers so the
// cooldown task keeps ticking while the user types.
async fn prompt<T, F>(term: &Term, ask: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Term) -> dialoguer::Result<T> + Send + 'static,
{
    let term = term.clone();
    Ok(tokio::task::spawn_blocking(move || ask(&term)).await??)
}

async fn select(term: &Term, label: String, items: Vec<String>) -> Result<usize> {
    prompt(term, move |term| {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(label)
            .items(&items)
            .default(0)
            .interact_on(term)
    })
    .await
}

async fn input(term: &Term, label: &'static str) -> Result<String> {
    prompt(term, move |term| {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(label)
            .interact_text_on(term)
    })
    .await
}

fn title(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Login => "Sign in",
        AuthMode::Signup => "Sign up",
    }
}

fn print_status<C: OtpChannel>(challenge: &OtpChallenge<C>) {
    let status = match challenge.status() {
        ChallengeStatus::Locked => "locked".bright_red(),
        ChallengeStatus::Verified => "verified".bright_green(),
        other => other.to_string().bright_yellow(),
    };
    let target = challenge
        .identifier()
        .map(ToString::to_string)
        .unwrap_or_default();

    println!();
    println!("  {} {}  {}", "status:".dimmed(), status, target.dimmed());
    println!(
        "  {} {}/{}   {} {}/{}",
        "attempts:".dimmed(),
        challenge.verify_attempts(),
        challenge.machine().config().max_verify_attempts,
        "resends:".dimmed(),
        challenge.resend_count(),
        challenge.machine().config().max_resend_attempts,
    );
}

fn print_error(err: &ChallengeError) {
    println!("{} {}", "✗".bright_red(), err.to_string().bright_red());
}
