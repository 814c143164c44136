//! # SUSTAIN Token
//!
//! Token counting for SUSTAIN.
//!
//! Every savings figure the engine reports is a difference of two counts
//! produced here, so all schemes are deterministic and infallible per call.

pub mod analyzer;
pub mod tokenizer;

pub use analyzer::{TokenAnalysis, analyze_text};
pub use tokenizer::{
    BpeTokenizer, HeuristicTokenizer, TokenCounter, TokenizerKind, load_tokenizer,
};
