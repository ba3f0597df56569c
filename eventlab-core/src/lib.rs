//! EventLab Core — event model, dispatcher, execution, portfolio, metrics.
//!
//! This crate contains the event-driven backtesting engine:
//! - Domain types (bars, the four event kinds, event ids)
//! - Data handler trait with in-memory, CSV and synthetic sources
//! - Strategy trait and reference strategies
//! - Simulated execution with per-venue commission and trade alerts
//! - Portfolio accounting and the equity curve
//! - Heartbeat dispatcher with a causal event journal
//! - Performance metrics (Sharpe ratio, drawdown)

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod execution;
pub mod performance;
pub mod portfolio;
pub mod strategy;

pub use data::{DataHandler, InMemoryDataHandler};
pub use domain::{
    Bar, BarField, Event, EventId, EventKind, FillEvent, MarketEvent, OrderEvent, OrderSide,
    SignalDirection, SignalEvent,
};
pub use engine::{
    BacktestEngine, BacktestReport, EngineConfig, RunSummary, StopHandle, StopReason,
};
pub use error::{EngineError, NotificationError};
pub use execution::{ExecutionHandler, SimulatedExecutionHandler};
pub use portfolio::{EquityPoint, OrderSizer, Portfolio, SummaryStats};
pub use strategy::{Strategy, StrategyConfig, StrategyOutput};
