//! Arithmetic short-circuit.
//!
//! Answers self-contained arithmetic queries locally so no model call is
//! made. Detection is deliberately conservative: a query is math only if,
//! after removing a fixed preamble, every lexeme is a number, an operator,
//! a parenthesis or a whitelisted name. Anything else is "not math".

mod parser;

use tracing::debug;

pub use parser::MAX_DEPTH;

/// Longest query considered for evaluation.
pub const MAX_QUERY_CHARS: usize = 256;

/// Leading phrases removed before parsing, longest first.
const PREAMBLES: &[&str] = &[
    "how much is",
    "what is",
    "what's",
    "whats",
    "calculate",
    "evaluate",
    "compute",
    "solve",
];

/// Detects and evaluates arithmetic queries.
#[derive(Debug, Clone, Copy)]
pub struct MathShortCircuit {
    named_functions: bool,
}

impl Default for MathShortCircuit {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MathShortCircuit {
    /// Create a detector; `named_functions` enables `pi`, `sqrt(..)` and friends.
    pub fn new(named_functions: bool) -> Self {
        Self { named_functions }
    }

    /// Evaluate `text` if it is confidently a pure arithmetic query.
    pub fn try_solve(&self, text: &str) -> Option<f64> {
        if text.chars().count() > MAX_QUERY_CHARS {
            return None;
        }

        let lowered = text.trim().to_lowercase();
        let expression = strip_preamble(&lowered);
        if expression.is_empty() {
            return None;
        }

        match parser::evaluate(expression, self.named_functions) {
            Ok(value) => {
                debug!(expression, value, "Math short-circuit");
                Some(value)
            }
            Err(reason) => {
                debug!(?reason, "Not an arithmetic query");
                None
            }
        }
    }
}

/// Evaluate `text` with the default detector.
pub fn try_solve(text: &str) -> Option<f64> {
    MathShortCircuit::default().try_solve(text)
}

/// Format a result for display: integers without a fraction, other values
/// with at most ten decimals.
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        return "0".to_string();
    }
    if !(1e-10..1e15).contains(&magnitude) {
        return format!("{:e}", value);
    }
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }

    let fixed = format!("{:.10}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" || trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Drop an optional "please", one question/command preamble, and trailing
/// punctuation such as "?" or "=".
fn strip_preamble(lowered: &str) -> &str {
    let mut rest = lowered.trim();
    rest = strip_word(rest, "please").unwrap_or(rest);
    rest = rest.trim_start_matches([',', ' ']);

    for preamble in PREAMBLES {
        if let Some(stripped) = strip_word(rest, preamble) {
            rest = stripped.trim_start_matches(':');
            break;
        }
    }

    rest.trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '=' | '!' | '.') || c.is_whitespace())
}

/// Strip `word` from the start of `text` when it ends on a word boundary.
fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(rest.trim_start()),
    }
}
