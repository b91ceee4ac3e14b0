// Interactive simulator for the msgly OTP sign-in flow

mod config;
mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use console::Term;
use otp_challenge::{AuthFlow, BackendChannel, OtpChannel, SimulatedChannel, TwilioChannel};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::TwilioService;

use crate::config::Config;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChannelChoice {
    /// Codes are generated locally and printed to the log
    Simulated,
    /// msgly backend at MSGLY_API_URL
    Backend,
    /// Twilio Verify using TWILIO_* credentials
    Twilio,
}

#[derive(Debug, Parser)]
#[command(name = "otp-sim", about = "Walk through the msgly OTP sign-in flow")]
struct Cli {
    /// Where codes are delivered and checked
    #[arg(long, value_enum, default_value = "simulated")]
    channel: ChannelChoice,

    /// Fraction of simulated deliveries that succeed
    #[arg(long, default_value_t = 1.0)]
    success_rate: f64,

    /// Seed for simulated codes
    #[arg(long)]
    seed: Option<u64>,
}

type SharedChannel = Arc<dyn OtpChannel>;

fn build_channel(cli: &Cli, config: &Config) -> Result<SharedChannel> {
    let channel: SharedChannel = match cli.channel {
        ChannelChoice::Simulated => {
            let simulated = match cli.seed {
                Some(seed) => SimulatedChannel::seeded(seed),
                None => SimulatedChannel::new(),
            };
            Arc::new(simulated.with_success_rate(cli.success_rate))
        }
        ChannelChoice::Backend => {
            let url = config
                .api_url
                .clone()
                .context("MSGLY_API_URL must be set for --channel backend")?;
            Arc::new(BackendChannel::new(url))
        }
        ChannelChoice::Twilio => {
            let options = config
                .twilio
                .clone()
                .context("Twilio credentials must be set for --channel twilio")?;
            Arc::new(TwilioChannel::new(Arc::new(TwilioService::new(options))))
        }
    };
    Ok(channel)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,otp_challenge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let channel = build_channel(&cli, &config)?;
    info!(channel = ?cli.channel, "OTP simulator ready");

    let term = Term::stdout();
    print_banner(&term)?;
    println!(
        "  {} {:?}   {} {}   {} {}s",
        "channel:".dimmed(),
        cli.channel,
        "max attempts:".dimmed(),
        config.throttle.max_verify_attempts,
        "cooldown:".dimmed(),
        config.throttle.resend_cooldown_secs,
    );
    println!();

    let mut flow = AuthFlow::new(Arc::clone(&channel), channel, config.throttle);
    session::run(&term, &mut flow).await
}

fn print_banner(term: &Term) -> Result<()> {
    term.clear_screen()?;
    println!(
        "{}",
        "╔════════════════════════════════════════╗".bright_cyan()
    );
    println!(
        "{}",
        "║        msgly OTP sign-in simulator     ║".bright_cyan()
    );
    println!(
        "{}",
        "╚════════════════════════════════════════╝".bright_cyan()
    );
    println!();
    Ok(())
}
