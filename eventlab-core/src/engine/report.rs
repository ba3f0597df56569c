//! Run counters and the final backtest report.

use serde::{Deserialize, Serialize};

use crate::domain::FillEvent;
use crate::portfolio::{EquityPoint, SummaryStats};

/// Why the heartbeat loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Queue empty and every symbol's bars consumed.
    #[default]
    Completed,
    /// External stop request, honored between heartbeats.
    Stopped,
    /// `max_heartbeats` reached.
    HeartbeatLimit,
}

/// Counters collected while the loop runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub strategy: String,
    pub venue: String,
    pub heartbeats: u64,
    pub market_events: u64,
    pub signals: u64,
    pub orders: u64,
    pub fills: u64,
    /// Events dropped after a handler error. Each one was logged as a warning.
    pub dropped: u64,
    pub stop_reason: StopReason,
}

impl RunSummary {
    pub fn events_dispatched(&self) -> u64 {
        self.market_events + self.signals + self.orders + self.fills
    }
}

/// Everything a finished run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub summary: SummaryStats,
    pub run: RunSummary,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<FillEvent>,
}
