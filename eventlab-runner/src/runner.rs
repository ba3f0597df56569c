//! Backtest runner — wires a `BacktestConfig` into the core engine.
//!
//! Two entry points:
//! - `run_backtest()`: loads bars from the configured source, then runs. Used by the CLI.
//! - `run_backtest_with_data()`: takes pre-loaded bars. Used by tests and callers
//!   with their own data.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use eventlab_core::data::{generate_synthetic_bars, load_csv_dir, InMemoryDataHandler};
use eventlab_core::engine::{BacktestEngine, BacktestReport, EngineConfig};
use eventlab_core::error::EngineError;
use eventlab_core::execution::{
    CommissionModel, FixedCommission, LogNotifier, PerShareCommission, SimulatedExecutionHandler,
    ZeroCommission,
};
use eventlab_core::portfolio::OrderSizer;
use eventlab_core::strategy::{
    BuyAndHold, MovingAverageCross, NullStrategy, Strategy, StrategyConfig,
};

use crate::config::{
    BacktestConfig, CommissionConfig, ConfigError, DataSource, RunId, DEFAULT_LONG_WINDOW,
    DEFAULT_SHORT_WINDOW,
};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// A finished run: the config that produced it, its id and the engine report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRun {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub report: BacktestReport,
}

/// Validate `config`, load its bars and run it.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestRun, RunError> {
    config.validate()?;
    let data = load_data(config)?;
    run_backtest_with_data(config, data)
}

/// Run `config` against bars the caller already has.
pub fn run_backtest_with_data(
    config: &BacktestConfig,
    data: InMemoryDataHandler,
) -> Result<BacktestRun, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    tracing::info!(
        run_id = %run_id,
        symbols = ?config.backtest.symbols,
        strategy = %config.strategy.component_type,
        "starting backtest"
    );

    let mut engine = build_engine(config, data)?;
    let report = engine.simulate_trading(&config.backtest.symbols)?;

    tracing::info!(
        run_id = %run_id,
        fills = report.run.fills,
        dropped = report.run.dropped,
        final_equity = report.summary.final_equity,
        "backtest complete"
    );

    Ok(BacktestRun {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        report,
    })
}

/// Load bars for every configured symbol, restricted to the date window.
pub fn load_data(config: &BacktestConfig) -> Result<InMemoryDataHandler, RunError> {
    let (start, end) = (config.start()?, config.end()?);
    let symbols = &config.backtest.symbols;

    let data = match &config.data {
        DataSource::Csv { dir } => load_csv_dir(dir, symbols)?.restrict_to(start, end),
        DataSource::Synthetic => {
            let mut data = InMemoryDataHandler::new();
            for symbol in symbols {
                data.insert_bars(generate_synthetic_bars(symbol, start, end));
            }
            data
        }
    };

    for symbol in symbols {
        tracing::debug!(symbol = %symbol, bars = data.bar_count(symbol), "bars loaded");
    }
    Ok(data)
}

/// Assemble an engine from `config` without running it.
pub fn build_engine(
    config: &BacktestConfig,
    data: InMemoryDataHandler,
) -> Result<BacktestEngine, RunError> {
    let bt = &config.backtest;
    let mut engine_config = EngineConfig::new(bt.initial_capital)
        .with_heartbeat(Duration::from_millis(bt.heartbeat_ms))
        .with_periods_per_year(bt.periods_per_year);
    if let Some(max) = bt.max_heartbeats {
        engine_config = engine_config.with_max_heartbeats(max);
    }

    let engine = BacktestEngine::new(
        engine_config,
        Box::new(data),
        build_strategy(config)?,
        Box::new(build_execution(config)),
    )
    .with_sizer(OrderSizer::fixed(config.sizing.quantity));
    Ok(engine)
}

pub fn build_strategy(config: &BacktestConfig) -> Result<Box<dyn Strategy>, RunError> {
    let strategy_config =
        StrategyConfig::backtest(config.backtest.symbols.clone(), config.backtest.initial_capital)
            .with_dates(config.start()?, config.end()?);

    let section = &config.strategy;
    let strategy: Box<dyn Strategy> = match section.component_type.as_str() {
        "null" => Box::new(NullStrategy),
        "buy_and_hold" => Box::new(BuyAndHold::new(strategy_config)),
        "moving_average_cross" => {
            let short = section.window("short", DEFAULT_SHORT_WINDOW)?;
            let long = section.window("long", DEFAULT_LONG_WINDOW)?;
            Box::new(MovingAverageCross::new(strategy_config, short, long)?)
        }
        other => {
            return Err(ConfigError::Invalid(format!("unknown strategy type '{other}'")).into())
        }
    };
    Ok(strategy)
}

pub fn build_execution(config: &BacktestConfig) -> SimulatedExecutionHandler {
    let section = &config.execution;
    let model: Box<dyn CommissionModel> = match section.commission {
        CommissionConfig::Zero => Box::new(ZeroCommission),
        CommissionConfig::PerShare { rate, minimum } => {
            Box::new(PerShareCommission::new(rate, minimum))
        }
        CommissionConfig::Fixed { amount } => Box::new(FixedCommission { amount }),
    };

    let mut handler = SimulatedExecutionHandler::new(section.venue.clone()).with_commission(model);
    if section.notify {
        handler = handler.with_notifier(Box::new(LogNotifier));
    }
    handler
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: &str) -> BacktestConfig {
        BacktestConfig::from_toml(&format!(
            r#"
[backtest]
symbols = ["SPY"]
start_date = "2024-01-02"
end_date = "2024-02-29"

[strategy]
type = "{strategy}"
"#
        ))
        .unwrap()
    }

    #[test]
    fn builds_each_known_strategy() {
        for (kind, name) in [
            ("null", "null"),
            ("buy_and_hold", "buy_and_hold"),
            ("moving_average_cross", "moving_average_cross"),
        ] {
            let strategy = build_strategy(&config(kind)).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        assert!(matches!(
            build_strategy(&config("martingale")),
            Err(RunError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn execution_uses_configured_commission() {
        let mut cfg = config("null");
        cfg.execution.commission = CommissionConfig::Fixed { amount: 2.5 };
        cfg.execution.venue = "ARCA".into();
        let handler = build_execution(&cfg);
        assert_eq!(handler.commission_model_name(), "fixed");
    }

    #[test]
    fn synthetic_data_covers_weekdays_in_window() {
        let data = load_data(&config("null")).unwrap();
        // 2024-01-02 .. 2024-02-29: 43 weekdays
        assert_eq!(data.bar_count("SPY"), 43);
    }
}
