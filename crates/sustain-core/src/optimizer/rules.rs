//! Ordered rewrite rule table.
//!
//! The optimizer's behavior is data: a list of rules applied in order, each
//! to the output of the previous one. New behavior is a new table entry.

use std::collections::HashSet;

use regex_lite::Regex;

use crate::config::SustainConfig;
use crate::error::{SustainError, SustainResult};

use super::protected;

/// Single rewrite step.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    kind: RuleKind,
}

#[derive(Debug, Clone)]
enum RuleKind {
    /// Regex replacement; `$1`-style group references are expanded.
    Replace { regex: Regex, replacement: String },
    /// Remove whole words (case-insensitive) unless they are protected.
    DropWords { words: HashSet<String> },
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply this rule to `text`.
    pub fn apply(&self, text: &str) -> String {
        match &self.kind {
            RuleKind::Replace { regex, replacement } => {
                regex.replace_all(text, replacement.as_str()).into_owned()
            }
            RuleKind::DropWords { words } => {
                let chunks: Vec<&str> = text.split_whitespace().collect();
                chunks
                    .iter()
                    .enumerate()
                    .filter(|(i, chunk)| {
                        !(words.contains(&chunk.to_lowercase()) && droppable(&chunks, *i))
                    })
                    .map(|(_, chunk)| *chunk)
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }
}

/// Whether the listed word at `chunks[index]` can go.
///
/// Protected words stay. So does a single letter beside "or"/"and"
/// ("a or b") and a capitalized word leading a name ("The Hague").
fn droppable(chunks: &[&str], index: usize) -> bool {
    let chunk = chunks[index];
    if protected::is_protected(chunk) {
        return false;
    }

    let prev = index.checked_sub(1).map(|i| chunks[i]);
    let next = chunks.get(index + 1).copied();

    if chunk.chars().count() == 1 && prev.into_iter().chain(next).any(is_conjunction) {
        return false;
    }
    if starts_uppercase(chunk) && next.is_some_and(starts_uppercase) {
        return false;
    }
    true
}

fn is_conjunction(chunk: &str) -> bool {
    let word = chunk.trim_matches(|c: char| !c.is_alphanumeric());
    word.eq_ignore_ascii_case("or") || word.eq_ignore_ascii_case("and")
}

fn starts_uppercase(chunk: &str) -> bool {
    chunk.chars().next().is_some_and(char::is_uppercase)
}

/// An ordered, compiled rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    /// The built-in table.
    pub fn default_rules() -> SustainResult<Self> {
        default_builder().build()
    }

    /// Built-in table (unless disabled) followed by the configured rules.
    pub fn from_config(config: &SustainConfig) -> SustainResult<Self> {
        let mut builder = if config.default_optimizer_rules {
            default_builder()
        } else {
            RuleSetBuilder::default()
        };

        for (index, rule) in config.optimizer_rules.iter().enumerate() {
            let name = rule
                .name
                .clone()
                .unwrap_or_else(|| format!("custom-{}", index + 1));
            builder = builder.replace(&name, &rule.pattern, &rule.replacement);
        }

        builder.build()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

enum PendingRule {
    Replace { pattern: String, replacement: String },
    DropWords { words: Vec<String> },
}

/// Collects rules in order; patterns are compiled by [`RuleSetBuilder::build`].
#[derive(Default)]
pub struct RuleSetBuilder {
    pending: Vec<(String, PendingRule)>,
}

impl RuleSetBuilder {
    /// Append a regex replacement rule.
    pub fn replace(mut self, name: &str, pattern: &str, replacement: &str) -> Self {
        self.pending.push((
            name.to_string(),
            PendingRule::Replace {
                pattern: pattern.to_string(),
                replacement: replacement.to_string(),
            },
        ));
        self
    }

    /// Append a word-removal rule.
    pub fn drop_words(mut self, name: &str, words: &[&str]) -> Self {
        self.pending.push((
            name.to_string(),
            PendingRule::DropWords {
                words: words.iter().map(|w| w.to_lowercase()).collect(),
            },
        ));
        self
    }

    /// Compile every rule, failing on the first invalid pattern.
    pub fn build(self) -> SustainResult<RuleSet> {
        let mut rules = Vec::with_capacity(self.pending.len());

        for (name, pending) in self.pending {
            let kind = match pending {
                PendingRule::Replace { pattern, replacement } => {
                    let regex = Regex::new(&pattern).map_err(|e| {
                        SustainError::config(format!("optimizer rule '{}': {}", name, e))
                    })?;
                    RuleKind::Replace { regex, replacement }
                }
                PendingRule::DropWords { words } => RuleKind::DropWords {
                    words: words.into_iter().collect(),
                },
            };
            rules.push(Rule { name, kind });
        }

        Ok(RuleSet { rules })
    }
}

/// Filler and stop words dropped word-by-word.
pub const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "very", "really", "just", "quite", "basically", "actually", "literally",
    "simply", "certainly", "definitely", "totally", "honestly", "um", "uh",
];

/// Words after "tell me" that make the rest of the prompt the question itself.
const QUESTION_LEAD: &str = "what|who|whom|whose|when|where|why|how|which";

fn default_builder() -> RuleSetBuilder {
    RuleSet::builder()
        .replace("collapse-whitespace", r"\s+", " ")
        .replace("trim", r"^ +| +$", "")
        .replace(
            "greeting",
            r"(?i)^(?:hi|hello|hey|greetings|good (?:morning|afternoon|evening))(?: there)?\b[,.!]*\s*",
            "",
        )
        .replace(
            "request-tell-me",
            &format!(
                r"(?i)\b(?:could|can|would|will) you(?: please| kindly)? tell me\s+({})\b",
                QUESTION_LEAD
            ),
            "$1",
        )
        .replace(
            "request-imperative",
            r"(?i)\b(?:could|can|would|will) you(?: please| kindly)? (tell|show|give|explain|help)(?: to)? me\b\s*",
            "$1 ",
        )
        .replace(
            "request-let-me-know",
            &format!(
                r"(?i)\b(?:could|can|would|will) you(?: please| kindly)? let me know\s+({})\b",
                QUESTION_LEAD
            ),
            "$1",
        )
        .replace(
            "request-please",
            r"(?i)\b(?:could|can|would|will) you (?:please|kindly)\b\s*",
            "",
        )
        .replace("would-you-mind", r"(?i)\bwould you mind\b\s*", "")
        .replace(
            "i-would-like-to-know",
            r"(?i)\bi(?: would|'d) like (?:you )?to know\b\s*",
            "",
        )
        .replace("i-would-like-you-to", r"(?i)\bi(?: would|'d) like you to\b\s*", "")
        .replace("i-want-to-know", r"(?i)\bi (?:want|need) to know\b\s*", "")
        .replace(
            "i-was-wondering",
            r"(?i)\bi was (?:just )?wondering(?: if| whether)?\b\s*",
            "",
        )
        .replace("do-you-know", r"(?i)^do you know\b\s*", "")
        .replace(
            "please-tell-me",
            &format!(r"(?i)\bplease tell me\s+({})\b", QUESTION_LEAD),
            "$1",
        )
        .replace("note-that", r"(?i)\b(?:please note|it is important to note) that\b\s*", "")
        .replace("as-an-ai", r"(?i)\bas an ai language model,?\s*", "")
        .replace("in-order-to", r"(?i)\bin order to\b", "to")
        .replace("due-to-the-fact", r"(?i)\bdue to the fact that\b", "because")
        .replace("in-spite-of-the-fact", r"(?i)\bin spite of the fact that\b", "although")
        .replace("at-this-point-in-time", r"(?i)\bat this point in time\b", "now")
        .replace("in-the-event-that", r"(?i)\bin the event that\b", "if")
        .replace("for-the-purpose-of", r"(?i)\bfor the purpose of\b", "for")
        .replace("with-regard-to", r"(?i)\bwith regards? to\b", "about")
        .replace("large-number-of", r"(?i)\ba (?:large|great) number of\b", "many")
        .replace(
            "leading-thanks",
            r"(?i)^(?:thanks|thank you)(?: (?:so|very) much)?(?: in advance)?[,.!]*\s*",
            "",
        )
        .replace(
            "trailing-thanks",
            r"(?i)[,;]?\s*\b(?:thanks|thank you)(?: (?:so|very) much)?(?: in advance)?[.!]*\s*$",
            "",
        )
        .replace("please", r"(?i)\b(?:please|kindly)\b,?\s*", "")
        .drop_words("filler-words", FILLER_WORDS)
        .replace("repeated-marks", r"([!?])[!?]+", "$1")
        .replace("repeated-dots", r"\.{2,}(\s|$)", ".$1")
        .replace("repeated-commas", r",{2,}", ",")
        .replace("space-before-punctuation", r"\s+([,.!?;:])(\s|$)", "$1$2")
        .replace("dangling-separator", r"[,;:]+([.!?])", "$1")
        .replace("trailing-separator", r"[,;:]+$", "")
        .replace("leading-punctuation", r"^(?:[\s,;:!?]|\.(?:\s|$))+", "")
        .replace("collapse-whitespace-final", r"\s+", " ")
        .replace("trim-final", r"^ +| +$", "")
}
