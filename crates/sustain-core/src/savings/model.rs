//! Savings data model.

use serde::{Deserialize, Serialize};

use crate::config::SustainConfig;

/// Token accounting for one completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    pub response_tokens: usize,
    /// Always within `[0, 100]`; exactly 100 for math short-circuits.
    pub percentage_saved: f64,
    pub was_math_shortcut: bool,
}

impl SavingsRecord {
    /// Prompt tokens not sent to the model. Never negative.
    pub fn tokens_saved(&self) -> usize {
        self.original_tokens.saturating_sub(self.optimized_tokens)
    }
}

/// Running totals for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub message_count: u64,
    pub total_percentage_saved: f64,
    pub total_tokens_saved: u64,
}

impl SessionStats {
    /// Mean percentage saved, if any message has been recorded.
    pub fn average(&self) -> Option<f64> {
        if self.message_count == 0 {
            None
        } else {
            Some(self.total_percentage_saved / self.message_count as f64)
        }
    }
}

/// Constants of the annual energy projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRates {
    /// kWh per token.
    pub kwh_per_token: f64,
    /// kg CO2 per kWh.
    pub co2_per_kwh: f64,
    /// Response tokens credited per exchange.
    pub assumed_response_tokens: usize,
}

impl Default for ImpactRates {
    fn default() -> Self {
        Self::from_config(&SustainConfig::default())
    }
}

impl ImpactRates {
    pub fn from_config(config: &SustainConfig) -> Self {
        Self {
            kwh_per_token: config.kwh_per_token,
            co2_per_kwh: config.co2_per_kwh,
            assumed_response_tokens: config.assumed_response_tokens,
        }
    }
}

/// Projected yearly savings if the session's pace is kept up daily.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyProjection {
    pub exchanges: usize,
    /// Tokens saved per day at the current pace.
    pub tokens_saved: u64,
    pub kwh: f64,
    /// Metric tons of CO2 (`co2_per_kwh` is in kg, divided by 1000).
    pub co2_tonnes: f64,
}

impl EnergyProjection {
    pub fn co2_kg(&self) -> f64 {
        self.co2_tonnes * 1000.0
    }
}
