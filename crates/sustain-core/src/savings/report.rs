//! Session savings reports.
//!
//! Formats the running totals, the per-exchange breakdown and the annual
//! projection as plain text.

use serde::Serialize;

use super::model::{EnergyProjection, SavingsRecord, SessionStats};
use super::SavingsAccountant;

/// Full savings report for a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub stats: SessionStats,
    pub average_saved: f64,
    pub math_shortcuts: usize,
    pub records: Vec<SavingsRecord>,
    pub projection: EnergyProjection,
}

impl SessionReport {
    /// Snapshot an accountant.
    pub fn new(accountant: &SavingsAccountant) -> Self {
        Self {
            stats: *accountant.stats(),
            average_saved: accountant.running_average(),
            math_shortcuts: accountant.history().iter().filter(|r| r.was_math_shortcut).count(),
            records: accountant.history().to_vec(),
            projection: accountant.project_annual_impact(),
        }
    }

    /// Sentence shown after the projection, matching the chat front-end wording.
    pub fn projection_message(&self) -> String {
        format!(
            "If you continue using SUSTAIN at this pace for a year, you will have saved \
             approximately {:.4} kWh of power, reducing {:.4} metric tons of CO2 emissions!",
            self.projection.kwh, self.projection.co2_tonnes
        )
    }

    /// Format the report as a human-readable string.
    pub fn to_display_string(&self) -> String {
        let mut output = String::new();

        output.push_str("Token Savings Report\n");
        output.push_str(&format!("{}\n", "─".repeat(50)));
        output.push_str(&format!("Messages:          {:>10}\n", self.stats.message_count));
        output.push_str(&format!("Math shortcuts:    {:>10}\n", self.math_shortcuts));
        output.push_str(&format!("Prompt tokens saved: {:>8}\n", self.stats.total_tokens_saved));
        output.push_str(&format!("Average saved:     {:>9.2}%\n", self.average_saved));
        output.push_str(&format!("{}\n\n", "─".repeat(50)));

        if !self.records.is_empty() {
            output.push_str("Breakdown by exchange:\n");

            for (i, record) in self.records.iter().enumerate() {
                let bar_len = ((record.percentage_saved / 4.0).round() as usize).max(1);
                let bar: String = "█".repeat(bar_len);
                let kind = if record.was_math_shortcut { "math" } else { "model" };

                output.push_str(&format!(
                    "  {:>3}. {:>5} -> {:<5} ({:>6.2}%) {} {}\n",
                    i + 1,
                    record.original_tokens,
                    record.optimized_tokens,
                    record.percentage_saved,
                    bar,
                    kind
                ));
            }

            output.push_str(&format!(
                "\nAnnual projection: {} tokens/day, {:.4} kWh, {:.4} t CO2\n",
                self.projection.tokens_saved, self.projection.kwh, self.projection.co2_tonnes
            ));
        }

        output
    }
}
