//! Local arithmetic.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use sustain_core::{MathShortCircuit, SustainConfig, format_number};

#[derive(Args)]
pub struct SolveArgs {
    /// Arithmetic query, e.g. "12 * (3 + 4)" or "what is 2^10"
    #[arg(required = true)]
    pub query: Vec<String>,
}

pub fn execute(args: SolveArgs, config: &SustainConfig) -> Result<()> {
    let query = args.query.join(" ");
    let math = MathShortCircuit::new(config.math_named_functions);

    match math.try_solve(&query) {
        Some(value) => {
            println!("{}", format_number(value).cyan().bold());
            Ok(())
        }
        None => bail!("Not an arithmetic query: {}", query),
    }
}
