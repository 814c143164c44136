//! Protected-token policy.
//!
//! Words the optimizer must never remove: negations, numerals, question
//! words and proper nouns. Proper nouns are approximated as capitalized
//! words that are not in the optimizer's own common-word lexicon, so the
//! check does not depend on where a word sits in the sentence.

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nor", "neither", "nothing", "nobody", "nowhere", "without",
    "cannot",
];

const QUESTION_WORDS: &[&str] = &[
    "what", "who", "whom", "whose", "when", "where", "why", "how", "which",
];

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    "hundred", "thousand", "million", "billion", "trillion", "half", "twice", "dozen", "first",
    "second", "third", "last",
];

/// Common words that are never proper nouns, even when capitalized.
const LEXICON: &[&str] = &[
    // fillers and stop words
    "a", "an", "the", "very", "really", "just", "quite", "basically", "actually", "literally",
    "simply", "certainly", "definitely", "totally", "honestly", "um", "uh", "so", "well",
    // politeness
    "please", "kindly", "thanks", "thank", "hi", "hello", "hey", "greetings", "good",
    "morning", "afternoon", "evening", "there", "advance", "much", "mind", "okay", "ok",
    // pronouns and auxiliaries
    "i", "i'm", "i'd", "me", "my", "we", "us", "our", "you", "your", "it", "its", "this",
    "that", "these", "those", "could", "would", "can", "will", "shall", "should", "may",
    "might", "must", "do", "does", "did", "is", "are", "am", "was", "were", "be", "been",
    "have", "has", "had", "let", "let's",
    // request verbs
    "tell", "show", "give", "explain", "help", "know", "like", "want", "need", "wondering",
    "note", "important", "make", "sure", "describe", "list", "write", "find",
    // connectives and phrase parts
    "if", "whether", "to", "of", "for", "and", "or", "but", "with", "about", "on", "at", "by",
    "from", "as", "in", "into", "order", "due", "fact", "point", "time", "event", "purpose",
    "regard", "spite", "large", "great", "number", "also", "then", "now", "because",
    "although", "many",
    // assistant boilerplate
    "ai", "language", "model",
];

/// Split `text` into words: maximal runs of alphanumerics and apostrophes.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .map(|w| w.trim_matches(|c| c == '\'' || c == '\u{2019}'))
        .filter(|w| !w.is_empty())
}

/// Whether `word` must survive optimization.
pub fn is_protected(word: &str) -> bool {
    if word.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }

    let lower = word.to_lowercase();
    let lower = lower.as_str();
    if NEGATIONS.contains(&lower) || lower.ends_with("n't") || lower.ends_with("n\u{2019}t") {
        return true;
    }
    if QUESTION_WORDS.contains(&lower) || NUMBER_WORDS.contains(&lower) {
        return true;
    }

    let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());
    capitalized && !LEXICON.contains(&lower)
}

/// The protected words of `text`, sorted, as a comparable signature.
///
/// A rewrite keeps meaning only if the signature is unchanged.
pub fn signature(text: &str) -> Vec<String> {
    let mut protected: Vec<String> = words(text)
        .filter(|w| is_protected(w))
        .map(str::to_string)
        .collect();
    protected.sort();
    protected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negations() {
        assert!(is_protected("not"));
        assert!(is_protected("Never"));
        assert!(is_protected("don't"));
        assert!(is_protected("isn\u{2019}t"));
    }

    #[test]
    fn test_numerals() {
        assert!(is_protected("42"));
        assert!(is_protected("3rd"));
        assert!(is_protected("twelve"));
    }

    #[test]
    fn test_question_words() {
        assert!(is_protected("what"));
        assert!(is_protected("How"));
    }

    #[test]
    fn test_proper_nouns() {
        assert!(is_protected("France"));
        assert!(is_protected("Rust"));
        assert!(!is_protected("Could"));
        assert!(!is_protected("The"));
        assert!(!is_protected("I"));
    }

    #[test]
    fn test_assistant_boilerplate_is_not_a_name() {
        assert!(!is_protected("AI"));
        assert!(!is_protected("Language"));
        assert_eq!(signature("As an AI language model, explain gravity"), Vec::<String>::new());
    }

    #[test]
    fn test_ordinary_words() {
        assert!(!is_protected("the"));
        assert!(!is_protected("capital"));
        assert!(!is_protected("please"));
    }

    #[test]
    fn test_words_split() {
        let collected: Vec<&str> = words("Don't stop, 'Paris' is 2x!").collect();
        assert_eq!(collected, vec!["Don't", "stop", "Paris", "is", "2x"]);
    }

    #[test]
    fn test_signature_ignores_position() {
        assert_eq!(
            signature("Tell me about Paris"),
            signature("Paris")
        );
        assert_ne!(signature("do not go"), signature("do go"));
    }
}
