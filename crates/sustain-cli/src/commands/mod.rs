//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sustain_core::{CONFIG_FILE_NAME, LanguageModel, OpenAiClient, SustainConfig, SustainEngine};

pub mod ask;
pub mod chat;
pub mod optimize;
pub mod solve;
pub mod tokens;

/// Environment variable holding the model API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// SUSTAIN - token-optimized language model chat
#[derive(Parser)]
#[command(name = "sustain")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (defaults to ./sustain.toml)
    #[arg(short, long, global = true, env = "SUSTAIN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(chat::ChatArgs),

    /// Send a single message and print the reply
    Ask(ask::AskArgs),

    /// Evaluate an arithmetic query locally
    Solve(solve::SolveArgs),

    /// Show the optimized form of a prompt
    Optimize(optimize::OptimizeArgs),

    /// Count tokens in a text or file
    Tokens(tokens::TokensArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => std::env::current_dir()
                .context("Failed to resolve current directory")?
                .join(CONFIG_FILE_NAME),
        };
        debug!(path = %config_path.display(), "Loading config");
        let config = load_config(&config_path)?;

        match self.command {
            Commands::Chat(args) => chat::execute(args, &config).await,
            Commands::Ask(args) => ask::execute(args, &config).await,
            Commands::Solve(args) => solve::execute(args, &config),
            Commands::Optimize(args) => optimize::execute(args, &config),
            Commands::Tokens(args) => tokens::execute(args, &config),
        }
    }
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<SustainConfig> {
    SustainConfig::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Build an engine backed by the HTTP model client.
pub fn build_engine(config: &SustainConfig) -> Result<SustainEngine> {
    let api_key = std::env::var(API_KEY_VAR)
        .with_context(|| format!("{} is not set. Export it to talk to the model.", API_KEY_VAR))?;

    let timeout = Duration::try_from_secs_f64(config.model_timeout_seconds)
        .context("Invalid model_timeout_seconds")?;
    let client = OpenAiClient::new(&api_key, &config.model, timeout)
        .context("Failed to create model client")?;
    let model: Arc<dyn LanguageModel> = Arc::new(client);

    SustainEngine::from_config(config, model).context("Failed to initialize engine")
}

/// Join positional words into one message, or read stdin when none are given.
pub fn message_from_args(words: &[String]) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }

    let mut buffer = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
        .context("Failed to read message from stdin")?;
    Ok(buffer)
}
