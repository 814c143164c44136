//! Token counting CLI command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use sustain_core::SustainConfig;
use sustain_token::{TokenizerKind, analyze_text, load_tokenizer};

use crate::output;

#[derive(Args)]
pub struct TokensArgs {
    /// Text to analyze (reads stdin when omitted)
    pub text: Vec<String>,

    /// Analyze a file instead of text
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Override the configured tokenizer (cl100k_base, o200k_base, heuristic)
    #[arg(long)]
    pub scheme: Option<TokenizerKind>,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: TokensArgs, config: &SustainConfig) -> Result<()> {
    let (source, content) = match &args.file {
        Some(path) => (
            path.display().to_string(),
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => ("input".to_string(), super::message_from_args(&args.text)?),
    };

    let counter = load_tokenizer(args.scheme.unwrap_or(config.tokenizer))?;
    let analysis = analyze_text(counter.as_ref(), &source, &content);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        output::print_token_analysis(&analysis);
    }

    Ok(())
}
