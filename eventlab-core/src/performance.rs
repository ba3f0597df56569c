//! Performance metrics — pure functions over a finished equity curve.
//!
//! Nothing here touches engine or portfolio state; calling any function twice
//! on the same input yields the same output.

use serde::{Deserialize, Serialize};

/// Bars per year for daily data.
pub const PERIODS_DAILY: f64 = 252.0;
/// Bars per year for hourly data (6.5 trading hours).
pub const PERIODS_HOURLY: f64 = 252.0 * 6.5;
/// Bars per year for minute data.
pub const PERIODS_MINUTELY: f64 = 252.0 * 6.5 * 60.0;

/// Below this a standard deviation is treated as zero.
const ZERO_STD: f64 = 1e-15;

/// Period-over-period fractional returns.
///
/// A non-positive previous value yields a 0.0 return for that step.
pub fn returns_from_equity(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Total return as a fraction: `final / initial - 1`.
pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    final_equity / initial - 1.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Annualized Sharpe ratio against a zero benchmark.
///
/// `sqrt(periods_per_year) * mean(returns) / std(returns)`, population std.
/// Returns `None` when the ratio is undefined: fewer than two returns or
/// zero variance.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let std = std_dev(returns);
    if std < ZERO_STD {
        return None;
    }
    Some(periods_per_year.sqrt() * mean(returns) / std)
}

/// Drawdown analysis of an equity curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    /// Running maximum of equity.
    pub high_water_mark: Vec<f64>,
    /// `hwm[t] - equity[t]`, in currency units.
    pub drawdown: Vec<f64>,
    /// Consecutive points spent below the high-water mark.
    pub duration: Vec<usize>,
    pub max_drawdown: f64,
    pub max_duration: usize,
}

/// Peak-to-trough drawdown series, its maximum and the longest underwater stretch.
///
/// Empty input yields empty series and zeros.
pub fn drawdown_series(equity: &[f64]) -> Drawdown {
    let mut out = Drawdown {
        high_water_mark: Vec::with_capacity(equity.len()),
        drawdown: Vec::with_capacity(equity.len()),
        duration: Vec::with_capacity(equity.len()),
        max_drawdown: 0.0,
        max_duration: 0,
    };

    let mut hwm = f64::NEG_INFINITY;
    let mut duration = 0usize;
    for &eq in equity {
        hwm = hwm.max(eq);
        let dd = hwm - eq;
        duration = if dd == 0.0 { 0 } else { duration + 1 };

        out.max_drawdown = out.max_drawdown.max(dd);
        out.max_duration = out.max_duration.max(duration);
        out.high_water_mark.push(hwm);
        out.drawdown.push(dd);
        out.duration.push(duration);
    }
    out
}
