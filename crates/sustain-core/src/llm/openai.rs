//! OpenAI-compatible chat completions client.
//!
//! Sends the optimized prompt as a single user message with a short
//! system prompt that keeps replies brief.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LanguageModel;
use crate::config::ModelConfig;
use crate::error::{SustainError, SustainResult};

/// Chat completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    system_prompt: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client. `timeout` bounds each HTTP request.
    pub fn new(api_key: &str, config: &ModelConfig, timeout: Duration) -> SustainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SustainError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
            client,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &self.system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> SustainResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| SustainError::upstream(format!("Failed to reach model API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SustainError::upstream(format!(
                "Model API error ({}): {}",
                status, body
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| SustainError::upstream(format!("Failed to parse model response: {}", e)))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SustainError::upstream("Model returned no content"))?;

        debug!(model = %self.model, chars = text.len(), "Model reply received");

        Ok(text)
    }
}
