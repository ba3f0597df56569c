//! End-of-run summary statistics.

use serde::{Deserialize, Serialize};

/// Summary of a finished run, computed from the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// `final_equity / initial_capital - 1`.
    pub total_return: f64,
    /// `None` when undefined (fewer than two returns or zero variance).
    pub sharpe_ratio: Option<f64>,
    /// Largest peak-to-trough loss, in currency units.
    pub max_drawdown: f64,
    /// Longest stretch of curve points below the high-water mark.
    pub max_drawdown_duration: usize,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub fill_count: usize,
    pub total_commission: f64,
}

impl SummaryStats {
    pub fn sharpe_display(&self) -> String {
        match self.sharpe_ratio {
            Some(s) => format!("{s:.4}"),
            None => "n/a".to_string(),
        }
    }
}
