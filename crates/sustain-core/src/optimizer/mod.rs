//! Prompt optimization.
//!
//! Rewrites a prompt into a shorter form that should still get the same
//! answer from the model. The work is done by an ordered [`RuleSet`]; this
//! module adds the guarantees around it:
//!
//! - a rewrite that would drop a protected word (negation, numeral,
//!   question word, proper noun) is rejected for that text,
//! - the table is re-applied until nothing changes, so the result is a
//!   fixpoint and `optimize(optimize(x)) == optimize(x)`,
//! - non-empty input never yields an empty prompt.

pub mod protected;
pub mod rules;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SustainConfig;
use crate::error::SustainResult;

pub use rules::{Rule, RuleSet, RuleSetBuilder};

/// Passes over the rule table before giving up on reaching a fixpoint.
pub const MAX_PASSES: usize = 8;

/// One rule application that changed the text.
#[derive(Debug, Clone, Serialize)]
pub struct RuleHit {
    pub rule: String,
    pub pass: usize,
    pub before: String,
    pub after: String,
    /// False when the rewrite was discarded by the protected-word check.
    pub accepted: bool,
}

/// Rule-driven prompt optimizer.
#[derive(Debug, Clone)]
pub struct TextOptimizer {
    rules: RuleSet,
}

impl TextOptimizer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Optimizer over the built-in rule table only.
    pub fn with_default_rules() -> SustainResult<Self> {
        Ok(Self::new(RuleSet::default_rules()?))
    }

    /// Build from configuration; fails only on an invalid rule pattern.
    pub fn from_config(config: &SustainConfig) -> SustainResult<Self> {
        Ok(Self::new(RuleSet::from_config(config)?))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Optimize `text`.
    pub fn optimize(&self, text: &str) -> String {
        self.run(text, |_| {})
    }

    /// Optimize `text` and report every rule that changed it.
    pub fn explain(&self, text: &str) -> (String, Vec<RuleHit>) {
        let mut hits = Vec::new();
        let optimized = self.run(text, |hit| hits.push(hit));
        (optimized, hits)
    }

    fn run(&self, text: &str, mut on_hit: impl FnMut(RuleHit)) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            // Whitespace-only input has nothing to remove and must not become "".
            return text.to_string();
        }

        let mut current = trimmed.to_string();
        let mut converged = false;

        for pass in 1..=MAX_PASSES {
            let before_pass = current.clone();
            current = self.apply_pass(current, pass, &mut on_hit);
            if current == before_pass {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(passes = MAX_PASSES, "Optimizer rules did not converge, keeping prompt");
            return trimmed.to_string();
        }

        if current.is_empty() {
            debug!("Optimization removed all content, keeping prompt");
            return trimmed.to_string();
        }

        current
    }

    fn apply_pass(
        &self,
        mut current: String,
        pass: usize,
        on_hit: &mut impl FnMut(RuleHit),
    ) -> String {
        let mut signature = protected::signature(&current);

        for rule in self.rules.rules() {
            let candidate = rule.apply(&current);
            if candidate == current {
                continue;
            }

            let candidate_signature = protected::signature(&candidate);
            let accepted = candidate_signature == signature;
            if !accepted {
                debug!(rule = rule.name(), "Rule rejected: would drop protected words");
            }

            on_hit(RuleHit {
                rule: rule.name().to_string(),
                pass,
                before: current.clone(),
                after: candidate.clone(),
                accepted,
            });

            if accepted {
                current = candidate;
                signature = candidate_signature;
            }
        }

        current.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn optimize(text: &str) -> String {
        TextOptimizer::with_default_rules().unwrap().optimize(text)
    }

    #[test]
    fn test_polite_preamble_removed() {
        let optimized = optimize("Could you please tell me what the capital of France is?");
        assert_eq!(optimized, "what capital of France is?");
    }

    #[test]
    fn test_greeting_and_thanks_removed() {
        assert_eq!(
            optimize("Hi there! Can you explain to me how DNS works? Thanks in advance!"),
            "explain how DNS works?"
        );
    }

    #[test]
    fn test_wordy_phrases_shortened() {
        assert_eq!(
            optimize("I was wondering if you could list the steps in order to bake bread"),
            "you could list steps to bake bread"
        );
    }

    #[test]
    fn test_whitespace_and_punctuation_collapsed() {
        assert_eq!(optimize("  why   is the sky   blue ??? "), "why is sky blue?");
        assert_eq!(optimize("wait...   what"), "wait. what");
    }

    #[test]
    fn test_protected_words_survive() {
        let optimized = optimize("Please do not delete the 3 files in Berlin, thanks");
        assert!(optimized.contains("not"));
        assert!(optimized.contains('3'));
        assert!(optimized.contains("Berlin"));
        assert_eq!(optimized, "do not delete 3 files in Berlin");
    }

    #[test]
    fn test_rule_dropping_protected_word_is_rejected() {
        let rules = RuleSet::builder()
            .replace("drop-not", r"\bnot\b ?", "")
            .replace("drop-very", r"\bvery\b ?", "")
            .build()
            .unwrap();
        let optimizer = TextOptimizer::new(rules);

        let (optimized, hits) = optimizer.explain("do not run very fast");
        assert_eq!(optimized, "do not run fast");
        assert!(hits.iter().any(|h| h.rule == "drop-not" && !h.accepted));
        assert!(hits.iter().any(|h| h.rule == "drop-very" && h.accepted));
    }

    #[test]
    fn test_never_empty() {
        assert_eq!(optimize("   "), "   ");
        assert_eq!(optimize("Please."), "Please.");
        assert_eq!(optimize("  thanks!  "), "thanks!");
        assert_eq!(optimize("the"), "the");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Could you please tell me what the capital of France is?",
            "Hi there! Can you explain to me how DNS works? Thanks in advance!",
            "I would like to know, due to the fact that it matters, why the sky is blue...",
            "Please note that the server is not responding!!!",
            "hello",
            "Please.",
            "   ",
            "12 apples and a large number of oranges, thank you",
            "Kindly, kindly, please, explain the the the rules ,, now",
        ];
        let optimizer = TextOptimizer::with_default_rules().unwrap();
        for sample in samples {
            let once = optimizer.optimize(sample);
            let twice = optimizer.optimize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
            assert!(!once.is_empty());
        }
    }

    #[test]
    fn test_optimized_is_never_longer_with_default_rules() {
        let optimizer = TextOptimizer::with_default_rules().unwrap();
        let text = "Could you kindly tell me, in order to plan, what the weather is like?";
        assert!(optimizer.optimize(text).len() < text.len());
    }

    #[test]
    fn test_explain_reports_hits_in_order() {
        let optimizer = TextOptimizer::with_default_rules().unwrap();
        let (optimized, hits) = optimizer.explain("Could you please tell me what the time is?");
        assert_eq!(optimized, "what time is?");
        let names: Vec<&str> = hits.iter().map(|h| h.rule.as_str()).collect();
        assert_eq!(names, vec!["request-tell-me", "filler-words"]);
        assert!(hits.iter().all(|h| h.accepted && h.pass == 1));
    }

    #[test]
    fn test_custom_rules_from_config() {
        let config = SustainConfig {
            optimizer_rules: vec![RuleConfig {
                name: Some("for-example".to_string()),
                pattern: r"(?i)\bfor example\b".to_string(),
                replacement: "e.g.".to_string(),
            }],
            ..SustainConfig::default()
        };
        let optimizer = TextOptimizer::from_config(&config).unwrap();
        assert_eq!(optimizer.optimize("list fruits, for example apples"), "list fruits, e.g. apples");
    }
}
