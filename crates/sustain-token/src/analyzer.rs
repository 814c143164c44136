//! Token analysis of a single piece of text.

use serde::Serialize;

use crate::tokenizer::TokenCounter;

/// Token count and size metrics for one text source.
#[derive(Debug, Clone, Serialize)]
pub struct TokenAnalysis {
    pub source: String,
    pub scheme: String,
    pub tokens: usize,
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
}

impl TokenAnalysis {
    /// Average characters per token, or 0 for empty text.
    pub fn chars_per_token(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.characters as f64 / self.tokens as f64
        }
    }
}

/// Analyze a string and count its tokens.
pub fn analyze_text(counter: &dyn TokenCounter, source: &str, content: &str) -> TokenAnalysis {
    TokenAnalysis {
        source: source.to_string(),
        scheme: counter.name().to_string(),
        tokens: counter.count_tokens(content),
        characters: content.chars().count(),
        words: content.split_whitespace().count(),
        lines: content.lines().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::HeuristicTokenizer;

    #[test]
    fn test_analyze_text() {
        let analysis = analyze_text(&HeuristicTokenizer, "prompt", "hello world\nsecond line");
        assert_eq!(analysis.source, "prompt");
        assert_eq!(analysis.scheme, "heuristic");
        assert_eq!(analysis.characters, 23);
        assert_eq!(analysis.tokens, 6);
        assert_eq!(analysis.words, 4);
        assert_eq!(analysis.lines, 2);
    }

    #[test]
    fn test_empty_text() {
        let analysis = analyze_text(&HeuristicTokenizer, "empty", "");
        assert_eq!(analysis.tokens, 0);
        assert_eq!(analysis.chars_per_token(), 0.0);
    }
}
