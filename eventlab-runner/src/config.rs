//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! symbols = ["SPY", "QQQ"]
//! start_date = "2024-01-02"
//! end_date = "2024-12-31"
//! initial_capital = 100000.0
//!
//! [data]
//! source = "csv"
//! dir = "data"
//!
//! [strategy]
//! type = "moving_average_cross"
//! [strategy.params]
//! short = 10.0
//! long = 50.0
//!
//! [sizing]
//! quantity = 100
//!
//! [execution]
//! venue = "SIM"
//! notify = true
//! [execution.commission]
//! model = "per_share"
//! rate = 0.005
//! minimum = 1.0
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use eventlab_core::execution::SIMULATED_VENUE;
use eventlab_core::performance::PERIODS_DAILY;
use eventlab_core::portfolio::DEFAULT_ORDER_QUANTITY;

/// Content hash of a configuration.
pub type RunId = String;

/// Strategy types the runner knows how to build.
pub const STRATEGY_TYPES: &[&str] = &["null", "buy_and_hold", "moving_average_cross"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub data: DataSource,
    pub strategy: StrategySection,
    #[serde(default)]
    pub sizing: SizingSection,
    #[serde(default)]
    pub execution: ExecutionSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    pub symbols: Vec<String>,
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: String,
    /// `YYYY-MM-DD`, inclusive.
    pub end_date: String,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default)]
    pub heartbeat_ms: u64,
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heartbeats: Option<u64>,
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_periods_per_year() -> f64 {
    PERIODS_DAILY
}

/// Where bars come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DataSource {
    /// `<dir>/<SYMBOL>.csv` per symbol.
    Csv { dir: PathBuf },
    /// Deterministic random walk per symbol.
    #[default]
    Synthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySection {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategySection {
    /// Integer parameter, falling back to `default` when absent.
    pub fn window(&self, name: &str, default: usize) -> Result<usize, ConfigError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(&v) if v >= 1.0 && v.fract() == 0.0 && v.is_finite() => Ok(v as usize),
            Some(&v) => Err(ConfigError::Invalid(format!(
                "strategy.params.{name} must be a positive integer, got {v}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizingSection {
    #[serde(default = "default_quantity")]
    pub quantity: u64,
}

fn default_quantity() -> u64 {
    DEFAULT_ORDER_QUANTITY
}

impl Default for SizingSection {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionSection {
    #[serde(default = "default_venue")]
    pub venue: String,
    /// Log a trade alert for every order.
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub commission: CommissionConfig,
}

fn default_venue() -> String {
    SIMULATED_VENUE.to_string()
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            venue: default_venue(),
            notify: false,
            commission: CommissionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum CommissionConfig {
    #[default]
    Zero,
    PerShare {
        rate: f64,
        #[serde(default)]
        minimum: f64,
    },
    Fixed {
        amount: f64,
    },
}

/// Default moving-average windows.
pub const DEFAULT_SHORT_WINDOW: usize = 10;
pub const DEFAULT_LONG_WINDOW: usize = 30;

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn start(&self) -> Result<NaiveDate, ConfigError> {
        parse_date("start_date", &self.backtest.start_date)
    }

    pub fn end(&self) -> Result<NaiveDate, ConfigError> {
        parse_date("end_date", &self.backtest.end_date)
    }

    /// Check everything that can be checked without loading data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbols.is_empty() {
            return Err(ConfigError::Invalid("backtest.symbols is empty".into()));
        }
        let mut seen = HashSet::new();
        for symbol in &bt.symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("blank symbol".into()));
            }
            if !seen.insert(symbol) {
                return Err(ConfigError::Invalid(format!("duplicate symbol: {symbol}")));
            }
        }

        let (start, end) = (self.start()?, self.end()?);
        if start > end {
            return Err(ConfigError::Invalid(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        if !bt.initial_capital.is_finite() || bt.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                bt.initial_capital
            )));
        }
        if !bt.periods_per_year.is_finite() || bt.periods_per_year <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "periods_per_year must be positive, got {}",
                bt.periods_per_year
            )));
        }

        if let DataSource::Csv { dir } = &self.data {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("data.dir is empty".into()));
            }
        }

        match self.strategy.component_type.as_str() {
            "null" | "buy_and_hold" => {}
            "moving_average_cross" => {
                let short = self.strategy.window("short", DEFAULT_SHORT_WINDOW)?;
                let long = self.strategy.window("long", DEFAULT_LONG_WINDOW)?;
                if long <= short {
                    return Err(ConfigError::Invalid(format!(
                        "moving_average_cross: long ({long}) must exceed short ({short})"
                    )));
                }
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown strategy type '{other}' (expected one of {})",
                    STRATEGY_TYPES.join(", ")
                )))
            }
        }

        if self.sizing.quantity == 0 {
            return Err(ConfigError::Invalid("sizing.quantity must be >= 1".into()));
        }
        if self.execution.venue.trim().is_empty() {
            return Err(ConfigError::Invalid("execution.venue is empty".into()));
        }
        match self.execution.commission {
            CommissionConfig::Zero => {}
            CommissionConfig::PerShare { rate, minimum } => {
                if !non_negative(rate) || !non_negative(minimum) {
                    return Err(ConfigError::Invalid(
                        "per_share commission rate and minimum must be non-negative".into(),
                    ));
                }
            }
            CommissionConfig::Fixed { amount } => {
                if !non_negative(amount) {
                    return Err(ConfigError::Invalid(
                        "fixed commission amount must be non-negative".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Deterministic id: BLAKE3 over the canonical JSON form.
    ///
    /// Two configs with identical content share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ConfigError::Invalid(format!("backtest.{field} '{value}': {e}")))
}
