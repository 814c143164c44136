//! Prompt optimization preview. Never calls the model.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use sustain_core::{SustainConfig, TextOptimizer, savings::percentage_saved};
use sustain_token::load_tokenizer;

use crate::output;

#[derive(Args)]
pub struct OptimizeArgs {
    /// Prompt to optimize (reads stdin when omitted)
    pub text: Vec<String>,

    /// Show each rule that changed the prompt
    #[arg(long)]
    pub explain: bool,
}

pub fn execute(args: OptimizeArgs, config: &SustainConfig) -> Result<()> {
    let text = super::message_from_args(&args.text)?;
    let optimizer = TextOptimizer::from_config(config).context("Invalid optimizer rules")?;
    let counter = load_tokenizer(config.tokenizer)?;

    let (optimized, hits) = optimizer.explain(&text);
    let before = counter.count_tokens(&text);
    let after = counter.count_tokens(&optimized);

    println!("{}", optimized.bold());
    println!(
        "{} {} -> {} tokens ({})",
        "Tokens:".dimmed(),
        before,
        after,
        output::savings_colored(percentage_saved(before, after, false))
    );

    if args.explain {
        println!();
        output::print_rule_hits(&hits);
    }

    Ok(())
}
