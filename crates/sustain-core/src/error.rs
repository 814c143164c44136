//! Centralized error types for SUSTAIN.

use thiserror::Error;

/// Main error type for SUSTAIN operations.
#[derive(Error, Debug)]
pub enum SustainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for SUSTAIN operations.
pub type SustainResult<T> = Result<T, SustainError>;

impl SustainError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an upstream (model call) error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
