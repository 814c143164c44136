//! One-shot exchange.

use anyhow::Result;
use clap::Args;

use sustain_core::SustainConfig;

use crate::output;

#[derive(Args)]
pub struct AskArgs {
    /// Message to send (reads stdin when omitted)
    pub message: Vec<String>,

    /// Print the reply and savings as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AskArgs, config: &SustainConfig) -> Result<()> {
    let message = super::message_from_args(&args.message)?;
    let engine = super::build_engine(config)?;
    let mut session = engine.new_session();

    let (reply, percentage_saved) = engine.get_response(&mut session, &message).await?;
    let was_math = session.history().last().is_some_and(|r| r.was_math_shortcut);

    if args.json {
        let result = serde_json::json!({
            "response": reply,
            "percentage_saved": percentage_saved,
            "math_shortcut": was_math,
            "record": session.history().last(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_reply(&reply);
        output::print_exchange_savings(percentage_saved, was_math);
    }

    Ok(())
}
