//! EventLab Runner — config-driven backtests and artifact export.
//!
//! This crate builds on `eventlab-core` to provide:
//! - TOML run configuration with validation and a content-hash run id
//! - Data loading from CSV directories or deterministic synthetic bars
//! - Engine assembly (strategy, execution, commission, sizing) from config
//! - JSON/CSV artifact export

pub mod config;
pub mod export;
pub mod runner;

pub use config::{BacktestConfig, CommissionConfig, ConfigError, DataSource, RunId};
pub use export::{
    export_equity_csv, export_fills_csv, export_summary_json, import_summary_json, load_summary,
    save_artifacts, SummaryArtifact,
};
pub use runner::{run_backtest, run_backtest_with_data, BacktestRun, RunError, SCHEMA_VERSION};
