//! Language model collaborator.
//!
//! The engine only crafts the prompt and consumes the raw text back; any
//! backend that can complete a prompt implements [`LanguageModel`].

pub mod openai;

use async_trait::async_trait;

use crate::error::SustainResult;

pub use openai::OpenAiClient;

/// A text completion backend.
///
/// Failures (network, auth, rate limit, malformed reply) are returned as
/// [`crate::SustainError::Upstream`].
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the model's reply text.
    async fn complete(&self, prompt: &str) -> SustainResult<String>;
}
