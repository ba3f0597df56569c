//! Artifact export — JSON summary, CSV equity curve and fill tape.
//!
//! `save_artifacts` writes one directory per run, named by run id:
//! - `summary.json`: schema version, run id, config, summary stats, run counters
//! - `equity.csv`: date, equity, high-water mark, drawdown
//! - `fills.csv`: one row per fill
//!
//! Persisted JSON carries a `schema_version`. Unknown versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use eventlab_core::domain::FillEvent;
use eventlab_core::engine::RunSummary;
use eventlab_core::performance::drawdown_series;
use eventlab_core::portfolio::{EquityPoint, SummaryStats};

use crate::config::{BacktestConfig, RunId};
use crate::runner::{BacktestRun, SCHEMA_VERSION};

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub summary: SummaryStats,
    pub run: RunSummary,
}

impl SummaryArtifact {
    pub fn from_run(run: &BacktestRun) -> Self {
        Self {
            schema_version: run.schema_version,
            run_id: run.run_id.clone(),
            config: run.config.clone(),
            summary: run.report.summary.clone(),
            run: run.report.run.clone(),
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_summary_json(run: &BacktestRun) -> Result<String> {
    serde_json::to_string_pretty(&SummaryArtifact::from_run(run))
        .context("failed to serialize run summary to JSON")
}

/// Parse a `summary.json`, rejecting schema versions newer than this build.
pub fn import_summary_json(json: &str) -> Result<SummaryArtifact> {
    let artifact: SummaryArtifact =
        serde_json::from_str(json).context("failed to deserialize run summary from JSON")?;
    if artifact.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            artifact.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(artifact)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: date, equity, high_water_mark, drawdown
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let equity: Vec<f64> = curve.iter().map(|p| p.equity).collect();
    let dd = drawdown_series(&equity);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "high_water_mark", "drawdown"])?;
    for (i, point) in curve.iter().enumerate() {
        wtr.write_record([
            point.timestamp.to_string(),
            format!("{:.2}", point.equity),
            format!("{:.2}", dd.high_water_mark[i]),
            format!("{:.2}", dd.drawdown[i]),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush equity CSV")?;
    String::from_utf8(bytes).context("equity CSV is not UTF-8")
}

/// Columns: date, symbol, side, quantity, price, fill_cost, commission, venue
pub fn export_fills_csv(fills: &[FillEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "symbol",
        "side",
        "quantity",
        "price",
        "fill_cost",
        "commission",
        "venue",
    ])?;
    for f in fills {
        wtr.write_record([
            f.timestamp.to_string(),
            f.symbol.clone(),
            f.direction.to_string(),
            f.quantity.to_string(),
            format!("{:.6}", f.price()),
            format!("{:.2}", f.fill_cost),
            format!("{:.2}", f.commission),
            f.venue.clone(),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush fills CSV")?;
    String::from_utf8(bytes).context("fills CSV is not UTF-8")
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Write `summary.json`, `equity.csv` and `fills.csv` under
/// `<output_dir>/<run_id>/`, returning that directory.
///
/// Re-running an identical config overwrites the same directory.
pub fn save_artifacts(run: &BacktestRun, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&run.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("summary.json"), export_summary_json(run)?)?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&run.report.equity_curve)?,
    )?;
    std::fs::write(run_dir.join("fills.csv"), export_fills_csv(&run.report.fills)?)?;

    tracing::info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load `summary.json` from an artifact directory.
pub fn load_summary(dir: &Path) -> Result<SummaryArtifact> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}
