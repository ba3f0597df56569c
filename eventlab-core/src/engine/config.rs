//! Engine configuration.

use std::time::Duration;

use crate::error::EngineError;
use crate::performance::PERIODS_DAILY;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Pause between fully drained queue passes. Zero runs flat out.
    pub heartbeat: Duration,
    /// Annualization factor for the Sharpe ratio.
    pub periods_per_year: f64,
    /// Hard cap on heartbeats; `None` runs until the data is exhausted.
    pub max_heartbeats: Option<u64>,
}

impl EngineConfig {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            heartbeat: Duration::ZERO,
            periods_per_year: PERIODS_DAILY,
            max_heartbeats: None,
        }
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn with_periods_per_year(mut self, periods_per_year: f64) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    pub fn with_max_heartbeats(mut self, max_heartbeats: u64) -> Self {
        self.max_heartbeats = Some(max_heartbeats);
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(EngineError::Configuration(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(EngineError::Configuration(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(100_000.0)
    }
}
