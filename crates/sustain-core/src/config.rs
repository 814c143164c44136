//! Engine configuration.
//!
//! Read from `sustain.toml`. Every field has a default, so a missing file
//! or an empty table yields a working engine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sustain_token::TokenizerKind;
use tracing::debug;

use crate::error::{SustainError, SustainResult};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "sustain.toml";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SustainConfig {
    /// Upper bound on a single model call.
    pub model_timeout_seconds: f64,
    /// Energy spent per token, in kWh.
    pub kwh_per_token: f64,
    /// Emissions per kWh, in kg CO2.
    pub co2_per_kwh: f64,
    /// Response tokens credited per exchange by the annual projection.
    pub assumed_response_tokens: usize,
    pub tokenizer: TokenizerKind,
    /// Accept named constants and functions (`pi`, `sqrt`, ...) in math queries.
    pub math_named_functions: bool,
    /// Start from the built-in optimizer rule table.
    pub default_optimizer_rules: bool,
    /// Extra rewrite rules, applied in order after the built-in table.
    pub optimizer_rules: Vec<RuleConfig>,
    pub model: ModelConfig,
}

impl Default for SustainConfig {
    fn default() -> Self {
        Self {
            model_timeout_seconds: 30.0,
            kwh_per_token: 0.0001,
            co2_per_kwh: 0.7,
            assumed_response_tokens: 50,
            tokenizer: TokenizerKind::default(),
            math_named_functions: true,
            default_optimizer_rules: true,
            optimizer_rules: Vec::new(),
            model: ModelConfig::default(),
        }
    }
}

/// A `(pattern, replacement)` rewrite rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

/// Settings for the HTTP language model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 150,
            system_prompt: "Answer concisely. Give only the essential information.".to_string(),
        }
    }
}

impl SustainConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> SustainResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or return defaults if the file does not exist.
    pub fn load(path: &Path) -> SustainResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config found at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        Self::from_toml_str(&content)
            .map_err(|e| SustainError::config(format!("{}: {}", path.display(), e)))
    }

    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> SustainResult<()> {
        if !(self.model_timeout_seconds.is_finite() && self.model_timeout_seconds > 0.0) {
            return Err(SustainError::config(format!(
                "model_timeout_seconds must be a positive number, got {}",
                self.model_timeout_seconds
            )));
        }
        if !(self.kwh_per_token.is_finite() && self.kwh_per_token >= 0.0) {
            return Err(SustainError::config("kwh_per_token must be non-negative"));
        }
        if !(self.co2_per_kwh.is_finite() && self.co2_per_kwh >= 0.0) {
            return Err(SustainError::config("co2_per_kwh must be non-negative"));
        }
        if !self.default_optimizer_rules && self.optimizer_rules.is_empty() {
            debug!("Optimizer has no rules; prompts will only be trimmed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SustainConfig::from_toml_str("").unwrap();
        assert_eq!(config, SustainConfig::default());
    }

    #[test]
    fn test_parse_full_document() {
        let toml_str = r#"
            model_timeout_seconds = 5.5
            kwh_per_token = 0.0002
            co2_per_kwh = 0.4
            tokenizer = "heuristic"
            math_named_functions = false
            optimizer_rules = [
                { pattern = "(?i)\\bfor example\\b", replacement = "e.g." },
                { name = "drop-um", pattern = "(?i)\\bum\\b" },
            ]

            [model]
            model = "gpt-4o"
            max_tokens = 64
        "#;
        let config = SustainConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.model_timeout_seconds, 5.5);
        assert_eq!(config.tokenizer, TokenizerKind::Heuristic);
        assert!(!config.math_named_functions);
        assert_eq!(config.optimizer_rules.len(), 2);
        assert_eq!(config.optimizer_rules[0].replacement, "e.g.");
        assert_eq!(config.optimizer_rules[1].name.as_deref(), Some("drop-um"));
        assert_eq!(config.optimizer_rules[1].replacement, "");
        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        let err = SustainConfig::from_toml_str("model_timeout_seconds = 0.0").unwrap_err();
        assert!(matches!(err, SustainError::Config(_)));
    }

    #[test]
    fn test_rejects_negative_constants() {
        assert!(SustainConfig::from_toml_str("co2_per_kwh = -1.0").is_err());
        assert!(SustainConfig::from_toml_str("kwh_per_token = -0.1").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SustainConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, SustainConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "assumed_response_tokens = 20\n").unwrap();
        let config = SustainConfig::load(&path).unwrap();
        assert_eq!(config.assumed_response_tokens, 20);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "model_timeout_seconds = \"soon\"\n").unwrap();
        let err = SustainConfig::load(&path).unwrap_err();
        assert!(matches!(err, SustainError::Config(_)));
    }
}
