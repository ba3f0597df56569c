//! Strategy contract — turns market events into trading intent.
//!
//! A strategy sees a `MarketEvent` and a read-only data handler. It never sees
//! the portfolio or the queue; anything it wants to do comes back as a
//! `StrategyOutput` that the dispatcher enqueues.

pub mod buy_and_hold;
pub mod ma_cross;
pub mod null;

pub use buy_and_hold::BuyAndHold;
pub use ma_cross::MovingAverageCross;
pub use null::NullStrategy;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::DataHandler;
use crate::domain::{Event, MarketEvent, OrderEvent, SignalEvent};
use crate::error::EngineError;

/// What a strategy may emit for one market event.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutput {
    Signal(SignalEvent),
    /// Bypass the portfolio's order generator and trade directly.
    Order(OrderEvent),
}

impl From<StrategyOutput> for Event {
    fn from(output: StrategyOutput) -> Self {
        match output {
            StrategyOutput::Signal(s) => Event::Signal(s),
            StrategyOutput::Order(o) => Event::Order(o),
        }
    }
}

/// Construction-time parameters shared by every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub symbols: Vec<String>,
    pub initial_capital: f64,
    pub is_backtest: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl StrategyConfig {
    pub fn backtest(symbols: Vec<String>, initial_capital: f64) -> Self {
        Self {
            symbols,
            initial_capital,
            is_backtest: true,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Whether `date` lies inside the configured window (open ends are unbounded).
    pub fn in_window(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |s| date >= s) && self.end_date.map_or(true, |e| date <= e)
    }
}

/// Trait for trading strategies.
///
/// # Contract
/// - Returning `Ok(None)` means "no trade"; it is never an error.
/// - Implementations may keep their own state (`&mut self`) but must not
///   reach into engine state.
/// - Errors (typically `PriceUnavailable`) cause the dispatcher to drop the
///   market event and continue.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "buy_and_hold").
    fn name(&self) -> &str;

    fn on_market(
        &mut self,
        event: &MarketEvent,
        data: &dyn DataHandler,
    ) -> Result<Option<StrategyOutput>, EngineError>;
}
