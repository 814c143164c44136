//! Interactive chat session.
//!
//! Every line goes through the engine; lines starting with `/` control the
//! session instead.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use sustain_core::{Session, SustainConfig, SustainEngine, SustainError};

use crate::output;

/// Fixed answer to "what is sustain?", never sent to the model.
const ABOUT: &str = "I am SUSTAIN, an environmentally-friendly, token-optimized AI wrapper \
designed to reduce compute costs and increase productivity. I filter out irrelevant words and \
phrases from prompts and limit responses to essential outputs, minimizing the number of tokens used.";

/// Plain words that end the session like `/quit`.
const FAREWELLS: &[&str] = &["exit", "quit", "bye", "goodbye"];

#[derive(Args)]
pub struct ChatArgs {
    /// Print the optimized prompt before each model call
    #[arg(long)]
    pub show_prompt: bool,
}

/// Slash commands available in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Stats,
    Impact,
    /// Reset the session totals.
    Clear,
    /// Write the transcript to a file.
    Save(Option<PathBuf>),
    Exit,
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, Some(arg.trim())),
        None => (trimmed, None),
    };

    match cmd.to_lowercase().as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/stats" => Some(ChatCommand::Stats),
        "/impact" => Some(ChatCommand::Impact),
        "/clear" => Some(ChatCommand::Clear),
        "/save" => Some(ChatCommand::Save(
            arg.filter(|a| !a.is_empty()).map(PathBuf::from),
        )),
        "/quit" | "/exit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// True for a bare farewell like "bye" or "Goodbye!".
pub fn is_farewell(input: &str) -> bool {
    let word = input
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    FAREWELLS.contains(&word.as_str())
}

/// True for the question answered locally with [`ABOUT`].
pub fn is_about_question(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("what is sustain?")
}

/// One line of the conversation.
#[derive(Debug, Clone)]
struct Turn {
    role: &'static str,
    text: String,
    percentage_saved: Option<f64>,
}

pub async fn execute(args: ChatArgs, config: &SustainConfig) -> Result<()> {
    let engine = crate::commands::build_engine(config)?;
    let mut session = engine.new_session();
    let mut transcript: Vec<Turn> = Vec::new();

    println!("{}", "Welcome to SUSTAIN Chat!".bold());
    println!(
        "{}",
        "Ask me: \"What is SUSTAIN?\" to learn more. Type /help for commands.".dimmed()
    );
    println!();

    loop {
        let line: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;

        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(cmd) = parse(text) {
            match cmd {
                ChatCommand::Help => print_help(),
                ChatCommand::Stats => output::print_stats(session.stats(), session.running_average()),
                ChatCommand::Impact => output::print_impact(&session.report()),
                ChatCommand::Clear => {
                    session.reset();
                    transcript.clear();
                    println!("{}", "Chat history cleared.".dimmed());
                }
                ChatCommand::Save(Some(path)) => match save_transcript(&path, &transcript, &session) {
                    Ok(()) => println!("{} Transcript saved to {}", "✓".green(), path.display()),
                    Err(e) => println!("{} {:#}", "!".red().bold(), e),
                },
                ChatCommand::Save(None) => println!("{} Usage: /save <path>", "?".yellow().bold()),
                ChatCommand::Exit => break,
                ChatCommand::Unknown(name) => println!(
                    "{} Unknown command: {}. Type /help for available commands.",
                    "?".yellow().bold(),
                    name.dimmed()
                ),
            }
            continue;
        }

        if is_farewell(text) {
            break;
        }

        if is_about_question(text) {
            output::print_reply(ABOUT);
            continue;
        }

        if args.show_prompt {
            println!("{} {}", "Prompt:".dimmed(), engine.optimize(text).dimmed());
        }

        transcript.push(Turn {
            role: "user",
            text: text.to_string(),
            percentage_saved: None,
        });

        match send(&engine, &mut session, text).await {
            Ok((reply, percentage_saved)) => {
                let was_math = session.history().last().is_some_and(|r| r.was_math_shortcut);
                output::print_reply(&reply);
                output::print_exchange_savings(percentage_saved, was_math);
                output::print_running_average(session.running_average());
                transcript.push(Turn {
                    role: "assistant",
                    text: reply,
                    percentage_saved: Some(percentage_saved),
                });
            }
            Err(e) => {
                transcript.pop();
                println!("{} {}", "!".red().bold(), e);
            }
        }
        println!();
    }

    println!("{}", "Session ended.".dimmed());
    if session.stats().message_count > 0 {
        output::print_impact(&session.report());
    }

    Ok(())
}

/// Run one exchange behind a spinner.
async fn send(
    engine: &SustainEngine,
    session: &mut Session,
    text: &str,
) -> Result<(String, f64), SustainError> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = engine.get_response(session, text).await;
    spinner.finish_and_clear();
    result
}

/// Write the conversation and its savings as JSON.
fn save_transcript(path: &Path, transcript: &[Turn], session: &Session) -> Result<()> {
    let messages: Vec<serde_json::Value> = transcript
        .iter()
        .map(|turn| {
            serde_json::json!({
                "role": turn.role,
                "content": turn.text,
                "percentage_saved": turn.percentage_saved,
            })
        })
        .collect();

    let document = serde_json::json!({
        "saved_at": chrono::Utc::now().to_rfc3339(),
        "average_saved": session.running_average(),
        "stats": session.stats(),
        "messages": messages,
    });

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

fn print_help() {
    println!();
    println!("  {}", "Available commands:".bold());
    println!();
    println!("  {}          {}", "/help".cyan(), "Show this help message");
    println!("  {}         {}", "/stats".cyan(), "Show session savings");
    println!("  {}        {}", "/impact".cyan(), "Project a year of savings in kWh and CO2");
    println!("  {}         {}", "/clear".cyan(), "Reset the session");
    println!("  {}  {}", "/save <path>".cyan(), "Write the transcript as JSON");
    println!("  {}          {}", "/quit".cyan(), "End the chat session");
    println!();
}
