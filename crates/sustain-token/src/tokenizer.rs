//! Token counting schemes.
//!
//! The default scheme is the `cl100k_base` BPE used by the OpenAI chat
//! models, loaded through tiktoken-rs. A character-ratio heuristic is
//! available for callers that do not want to load BPE tables.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Largest input, in bytes, that is BPE-encoded exactly.
///
/// Anything past this limit (cut at the nearest char boundary below it) is
/// counted with the heuristic ratio and added to the exact count, so very
/// long inputs never fail and never drop their tail from the total.
pub const MAX_ENCODE_BYTES: usize = 1024 * 1024;

/// Largest piece handed to the BPE encoder at once.
///
/// BPE merging is quadratic in the length of a single pre-token, so an
/// unbroken run (base64, minified JSON) is encoded piecewise. Pieces end at
/// whitespace when the window has any.
pub const ENCODE_CHUNK_BYTES: usize = 1024;

/// Characters per token used by the heuristic scheme.
pub const CHARS_PER_TOKEN: usize = 4;

/// Something that can count tokens in a string.
///
/// Implementations must be deterministic and must not fail on any input.
pub trait TokenCounter: Send + Sync {
    /// Name of the tokenization scheme (e.g. "cl100k_base").
    fn name(&self) -> &str;

    /// Count the tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Selectable tokenization schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenizerKind {
    #[default]
    #[serde(rename = "cl100k_base")]
    Cl100kBase,
    #[serde(rename = "o200k_base")]
    O200kBase,
    #[serde(rename = "heuristic")]
    Heuristic,
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
            Self::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

impl FromStr for TokenizerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k_base" | "cl100k" => Ok(Self::Cl100kBase),
            "o200k_base" | "o200k" => Ok(Self::O200kBase),
            "heuristic" => Ok(Self::Heuristic),
            other => Err(format!(
                "unknown tokenizer '{}' (expected cl100k_base, o200k_base or heuristic)",
                other
            )),
        }
    }
}

/// Load the counter for a scheme.
pub fn load_tokenizer(kind: TokenizerKind) -> Result<Arc<dyn TokenCounter>> {
    let counter: Arc<dyn TokenCounter> = match kind {
        TokenizerKind::Cl100kBase => Arc::new(BpeTokenizer::cl100k_base()?),
        TokenizerKind::O200kBase => Arc::new(BpeTokenizer::o200k_base()?),
        TokenizerKind::Heuristic => Arc::new(HeuristicTokenizer),
    };
    Ok(counter)
}

/// BPE token counter backed by tiktoken-rs.
pub struct BpeTokenizer {
    name: &'static str,
    bpe: CoreBPE,
}

impl BpeTokenizer {
    /// Load the cl100k_base encoding.
    pub fn cl100k_base() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .context("Failed to load cl100k_base tokenizer")?;
        Ok(Self { name: "cl100k_base", bpe })
    }

    /// Load the o200k_base encoding.
    pub fn o200k_base() -> Result<Self> {
        let bpe = tiktoken_rs::o200k_base()
            .context("Failed to load o200k_base tokenizer")?;
        Ok(Self { name: "o200k_base", bpe })
    }
}

impl TokenCounter for BpeTokenizer {
    fn name(&self) -> &str {
        self.name
    }

    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let (head, tail) = split_at_limit(text, MAX_ENCODE_BYTES);
        let exact: usize = chunks(head, ENCODE_CHUNK_BYTES)
            .map(|chunk| self.bpe.encode_with_special_tokens(chunk).len())
            .sum();

        if tail.is_empty() {
            return exact;
        }

        debug!(
            encoded_bytes = head.len(),
            estimated_bytes = tail.len(),
            "Input exceeds BPE limit, estimating remainder"
        );
        exact + heuristic_count(tail)
    }
}

/// Character-ratio counter: one token per four characters, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenizer;

impl TokenCounter for HeuristicTokenizer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn count_tokens(&self, text: &str) -> usize {
        heuristic_count(text)
    }
}

fn heuristic_count(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Split `text` at the largest char boundary not past `limit`.
fn split_at_limit(text: &str, limit: usize) -> (&str, &str) {
    if text.len() <= limit {
        return (text, "");
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.split_at(cut)
}

/// Split `text` into pieces of at most `limit` bytes, preferring to cut
/// just before whitespace.
fn chunks(text: &str, limit: usize) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (window, _) = split_at_limit(rest, limit);
        if window.is_empty() {
            // `limit` is smaller than the first char; take that char whole.
            let first = rest.chars().next().map_or(rest.len(), char::len_utf8);
            let (piece, remainder) = rest.split_at(first);
            rest = remainder;
            return Some(piece);
        }
        let cut = if window.len() == rest.len() {
            window.len()
        } else {
            match window.rfind(char::is_whitespace) {
                Some(at) if at > 0 => at,
                _ => window.len(),
            }
        };
        let (piece, remainder) = rest.split_at(cut);
        rest = remainder;
        Some(piece)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        assert_eq!(bpe.count_tokens(""), 0);
        assert_eq!(HeuristicTokenizer.count_tokens(""), 0);
    }

    #[test]
    fn test_whitespace_and_control_chars_count() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        assert!(bpe.count_tokens("   ") > 0);
        assert!(bpe.count_tokens("\u{0}\u{7}\t") > 0);
    }

    #[test]
    fn test_deterministic() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        let text = "What is the capital of France?";
        assert_eq!(bpe.count_tokens(text), bpe.count_tokens(text));
        assert!(bpe.count_tokens(text) >= 6);
    }

    #[test]
    fn test_special_tokens_are_ordinary_content() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        assert!(bpe.count_tokens("<|endoftext|>") >= 1);
    }

    #[test]
    fn test_heuristic_rounds_up() {
        assert_eq!(HeuristicTokenizer.count_tokens("abc"), 1);
        assert_eq!(HeuristicTokenizer.count_tokens("abcd"), 1);
        assert_eq!(HeuristicTokenizer.count_tokens("abcde"), 2);
    }

    #[test]
    fn test_split_respects_char_boundary() {
        let text = "aé";
        let (head, tail) = split_at_limit(text, 2);
        assert_eq!(head, "a");
        assert_eq!(tail, "é");
    }

    #[test]
    fn test_long_input_counts_tail() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        let long = "word ".repeat(MAX_ENCODE_BYTES / 5 + 1000);
        let head_only = "word ".repeat(MAX_ENCODE_BYTES / 5);
        assert!(bpe.count_tokens(&long) > bpe.count_tokens(&head_only));
    }

    #[test]
    fn test_kind_names_round_trip_through_serde() {
        let kind: TokenizerKind = serde_json::from_str("\"o200k_base\"").unwrap();
        assert_eq!(kind, TokenizerKind::O200kBase);
        assert_eq!(kind.to_string(), "o200k_base");
    }

    #[test]
    fn test_chunks_cut_at_whitespace() {
        let pieces: Vec<&str> = chunks("alpha beta gamma", 8).collect();
        assert_eq!(pieces, vec!["alpha", " beta", " gamma"]);
        assert_eq!(pieces.concat(), "alpha beta gamma");
    }

    #[test]
    fn test_chunks_without_whitespace_respect_char_boundary() {
        let text = "é".repeat(5);
        let pieces: Vec<&str> = chunks(&text, 3).collect();
        assert!(pieces.iter().all(|p| p.len() <= 3 && !p.is_empty()));
        assert_eq!(pieces.concat(), text);

        let tiny: Vec<&str> = chunks("éa", 1).collect();
        assert_eq!(tiny, vec!["é", "a"]);
    }

    #[test]
    fn test_long_unbroken_run_is_fast() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        let blob = "a".repeat(200_000);

        let started = std::time::Instant::now();
        let count = bpe.count_tokens(&blob);

        assert!(count > 0);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(15),
            "counting took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_chunked_count_matches_short_text() {
        let bpe = BpeTokenizer::cl100k_base().unwrap();
        let text = "What is the capital of France?";
        assert_eq!(bpe.count_tokens(text), bpe.bpe.encode_with_special_tokens(text).len());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("cl100k_base".parse::<TokenizerKind>(), Ok(TokenizerKind::Cl100kBase));
        assert_eq!("O200K".parse::<TokenizerKind>(), Ok(TokenizerKind::O200kBase));
        assert!("gpt2".parse::<TokenizerKind>().is_err());
    }

    #[test]
    fn test_load_heuristic() {
        let counter = load_tokenizer(TokenizerKind::Heuristic).unwrap();
        assert_eq!(counter.name(), "heuristic");
    }
}
