//! SUSTAIN CLI - token-optimized language model chat
//!
//! Optimizes prompts before they reach the model, answers arithmetic
//! locally and reports the tokens and energy saved.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Initialize tracing on stderr so replies on stdout stay clean.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "sustain=debug,sustain_core=debug,sustain_token=debug"
    } else {
        "sustain=info,sustain_core=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
