//! SUSTAIN Core Library
//!
//! Prompt optimization, arithmetic short-circuiting and savings accounting
//! for language model chat.

pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod math;
pub mod optimizer;
pub mod savings;

pub use config::{CONFIG_FILE_NAME, ModelConfig, RuleConfig, SustainConfig};
pub use engine::{Session, SustainEngine};
pub use error::{SustainError, SustainResult};
pub use llm::{LanguageModel, OpenAiClient};
pub use math::{MathShortCircuit, format_number, try_solve};
pub use optimizer::{RuleHit, TextOptimizer};
pub use savings::{
    EnergyProjection, ImpactRates, SavingsAccountant, SavingsRecord, SessionReport, SessionStats,
};
