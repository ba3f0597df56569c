//! Backtesting engine — heartbeat dispatcher and its supporting pieces.
//!
//! The engine owns the event queue and the per-symbol replay cursors. Each
//! heartbeat it drains the queue, routing:
//!
//! 1. Market → strategy
//! 2. Signal → portfolio order generator
//! 3. Order → execution handler
//! 4. Fill → portfolio
//!
//! and then schedules the next market event for every symbol it advanced.

pub mod backtest;
pub mod config;
pub mod journal;
pub mod queue;
pub mod report;
pub mod stop;

pub use backtest::BacktestEngine;
pub use config::EngineConfig;
pub use journal::{Journal, JournalEntry, Outcome};
pub use queue::{EventQueue, QueuedEvent};
pub use report::{BacktestReport, RunSummary, StopReason};
pub use stop::StopHandle;
