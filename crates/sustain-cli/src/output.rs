//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use sustain_core::{RuleHit, SessionReport, SessionStats};
use sustain_token::TokenAnalysis;
use unicode_width::UnicodeWidthStr;

/// Print a model or math reply.
pub fn print_reply(reply: &str) {
    println!("{} {}", "SUSTAIN:".cyan().bold(), reply);
}

/// Print the savings line for one exchange.
pub fn print_exchange_savings(percentage_saved: f64, was_math_shortcut: bool) {
    if was_math_shortcut {
        println!(
            "{}",
            "You saved 100% tokens by using SUSTAIN's math optimizer!".dimmed()
        );
    } else {
        println!(
            "{}",
            format!(
                "With SUSTAIN, you saved {:.2}% more tokens compared to traditional AI!",
                percentage_saved
            )
            .dimmed()
        );
    }
}

/// Print the running average after an exchange.
pub fn print_running_average(average: f64) {
    println!(
        "Average token savings: {}. {}",
        savings_colored(average),
        "Thank you for going green!".green()
    );
}

/// Print the session totals.
pub fn print_stats(stats: &SessionStats, average: f64) {
    println!("{}", "Session".bold());
    println!("{}", "─".repeat(40));
    println!("  Messages:      {}", stats.message_count.to_string().cyan());
    println!("  Tokens saved:  {}", stats.total_tokens_saved.to_string().cyan());
    println!("  Average saved: {}", savings_colored(average));
    println!("{}", "─".repeat(40));
}

/// Print the annual energy projection of a session.
pub fn print_impact(report: &SessionReport) {
    if report.records.is_empty() {
        println!("{}", "No exchanges yet. Send a message first.".dimmed());
        return;
    }

    println!("{}", "Energy Impact".bold());
    println!("{}", "─".repeat(40));
    println!("  Tokens/day:   {}", report.projection.tokens_saved.to_string().cyan());
    println!("  kWh/year:     {}", format!("{:.4}", report.projection.kwh).green());
    println!("  CO2/year:     {} kg", format!("{:.4}", report.projection.co2_kg()).green());
    println!("{}", "─".repeat(40));
    println!("{}", report.projection_message().green());
}

/// Print every rule that fired while optimizing a prompt.
pub fn print_rule_hits(hits: &[RuleHit]) {
    if hits.is_empty() {
        println!("{}", "No rule changed the prompt.".dimmed());
        return;
    }

    let width = term_width().saturating_sub(30).max(20);

    println!("{:<4} {:<24} {}", "Pass", "Rule", "Result");
    println!("{}", "─".repeat(width + 30));

    for hit in hits {
        let rule = pad_right(&hit.rule, 24);
        let result = truncate_visual(&hit.after, width);
        if hit.accepted {
            println!("{:<4} {} {}", hit.pass, rule.cyan(), result);
        } else {
            println!(
                "{:<4} {} {} {}",
                hit.pass,
                rule.dimmed(),
                result.dimmed().strikethrough(),
                "(kept: protected word)".yellow()
            );
        }
    }
}

/// Print a token analysis.
pub fn print_token_analysis(analysis: &TokenAnalysis) {
    println!("{}", "Token Analysis".bold());
    println!("{}", "─".repeat(40));
    println!("  Source:     {}", analysis.source);
    println!("  Scheme:     {}", analysis.scheme);
    println!("  Tokens:     {}", analysis.tokens.to_string().cyan());
    println!("  Characters: {}", analysis.characters);
    println!("  Words:      {}", analysis.words);
    println!("  Lines:      {}", analysis.lines);
    println!("  Chars/tok:  {:.2}", analysis.chars_per_token());
    println!("{}", "─".repeat(40));
}

/// Color a percentage by how much was saved.
pub fn savings_colored(percentage: f64) -> ColoredString {
    let label = format!("{:.2}%", percentage);
    if percentage >= 30.0 {
        label.green().bold()
    } else if percentage > 0.0 {
        label.yellow()
    } else {
        label.dimmed()
    }
}

/// Get terminal width, defaulting to 80.
fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("trim", 6), "trim  ");
        assert_eq!(pad_right("collapse", 4), "collapse");
    }

    #[test]
    fn test_truncate_visual() {
        assert_eq!(truncate_visual("short", 10), "short");
        assert_eq!(truncate_visual("what capital of France is?", 10), "what cap..");
        assert_eq!(truncate_visual("abcdef", 3), "...");
    }
}
