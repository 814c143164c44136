//! Savings accounting.
//!
//! Turns token counts into per-exchange percentages, keeps the session's
//! running totals and projects them onto a year of energy use.

pub mod model;
pub mod report;

pub use model::{EnergyProjection, ImpactRates, SavingsRecord, SessionStats};
pub use report::SessionReport;

/// Days in the projection year.
const DAYS_PER_YEAR: f64 = 365.0;

/// Percentage of prompt tokens saved, clamped to `[0, 100]`.
///
/// Math short-circuits save everything. A prompt that grew during
/// optimization saves nothing rather than a negative amount.
pub fn percentage_saved(original_tokens: usize, optimized_tokens: usize, was_math_shortcut: bool) -> f64 {
    if was_math_shortcut {
        return 100.0;
    }
    if original_tokens == 0 || optimized_tokens >= original_tokens {
        return 0.0;
    }
    let saved = (original_tokens - optimized_tokens) as f64;
    (100.0 * saved / original_tokens as f64).clamp(0.0, 100.0)
}

/// Project a year of savings from a session history.
///
/// `kwh = tokens_saved * kwh_per_token * 365` where `tokens_saved` counts,
/// per exchange, the prompt tokens not sent plus the assumed response
/// tokens; `co2_tonnes = kwh * co2_per_kwh / 1000`.
pub fn project_annual_impact(history: &[SavingsRecord], rates: &ImpactRates) -> EnergyProjection {
    let tokens_saved: u64 = history
        .iter()
        .map(|r| (r.tokens_saved() + rates.assumed_response_tokens) as u64)
        .sum();

    let kwh = tokens_saved as f64 * rates.kwh_per_token * DAYS_PER_YEAR;
    let co2_tonnes = kwh * rates.co2_per_kwh / 1000.0;

    EnergyProjection {
        exchanges: history.len(),
        tokens_saved,
        kwh,
        co2_tonnes,
    }
}

/// Per-session accumulator of savings.
#[derive(Debug, Clone, Default)]
pub struct SavingsAccountant {
    stats: SessionStats,
    history: Vec<SavingsRecord>,
    rates: ImpactRates,
}

impl SavingsAccountant {
    pub fn new(rates: ImpactRates) -> Self {
        Self {
            stats: SessionStats::default(),
            history: Vec::new(),
            rates,
        }
    }

    /// Record one completed exchange and update every total together.
    pub fn record_exchange(
        &mut self,
        original_tokens: usize,
        optimized_tokens: usize,
        response_tokens: usize,
        was_math_shortcut: bool,
    ) -> SavingsRecord {
        let record = SavingsRecord {
            original_tokens,
            optimized_tokens,
            response_tokens,
            percentage_saved: percentage_saved(original_tokens, optimized_tokens, was_math_shortcut),
            was_math_shortcut,
        };

        self.stats = SessionStats {
            message_count: self.stats.message_count + 1,
            total_percentage_saved: self.stats.total_percentage_saved + record.percentage_saved,
            total_tokens_saved: self.stats.total_tokens_saved + record.tokens_saved() as u64,
        };
        self.history.push(record);

        record
    }

    /// Mean percentage saved; 0.0 before the first exchange.
    pub fn running_average(&self) -> f64 {
        self.stats.average().unwrap_or(0.0)
    }

    /// Annual projection over this session's history.
    pub fn project_annual_impact(&self) -> EnergyProjection {
        project_annual_impact(&self.history, &self.rates)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn history(&self) -> &[SavingsRecord] {
        &self.history
    }

    pub fn rates(&self) -> &ImpactRates {
        &self.rates
    }

    /// Clear all totals and history.
    pub fn reset(&mut self) {
        self.stats = SessionStats::default();
        self.history.clear();
    }
}
