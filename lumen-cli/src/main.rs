//! Lumen CLI
//!
//! Command-line interface for generating and analyzing media through the
//! generative-media API.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Config, Overrides};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Generate and analyze images, videos and text", long_about = None)]
struct Cli {
    /// API base URL
    #[arg(long, env = "LUMEN_BASE_URL")]
    base_url: Option<String>,

    /// Attempts per call before giving up
    #[arg(long, env = "LUMEN_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "lumen_cli=debug,lumen_client=debug"
    } else {
        "lumen_cli=info,lumen_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(Overrides {
        base_url: cli.base_url,
        max_attempts: cli.max_attempts,
    })?;

    // Ctrl-C stops pending retries and polling
    let cancel = config.cancel.clone();
    tokio::spawn(cancel_on_ctrl_c(cancel));

    handle_command(cli.command, &config).await
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling");
        cancel.cancel();
    }
}
