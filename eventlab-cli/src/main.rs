//! EventLab CLI — run and validate event-driven backtests.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and save artifacts
//! - `validate` — parse and check a config without running it

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use eventlab_core::engine::StopReason;
use eventlab_core::error::EngineError;
use eventlab_runner::export::{save_artifacts, SummaryArtifact};
use eventlab_runner::runner::{run_backtest, BacktestRun, RunError};
use eventlab_runner::BacktestConfig;

#[derive(Parser)]
#[command(
    name = "eventlab",
    about = "EventLab CLI — event-driven backtesting engine"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, eventlab_core=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,

        /// Print the summary as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Parse and validate a TOML config file without running it.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            no_save,
            json,
        } => run_cmd(config, output_dir, no_save, json),
        Commands::Validate { config } => validate_cmd(config),
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    let config = BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load config: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(config)
}

fn run_cmd(config_path: PathBuf, output_dir: PathBuf, no_save: bool, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    tracing::info!(
        config = %config_path.display(),
        symbols = %config.backtest.symbols.join(","),
        strategy = %config.strategy.component_type,
        "starting backtest"
    );

    let run = match run_backtest(&config) {
        Ok(run) => run,
        Err(RunError::Engine(EngineError::EmptyCurve)) => {
            bail!(
                "backtest produced no fills, so there is no equity curve to summarize \
                 (strategy '{}' never traded)",
                config.strategy.component_type
            );
        }
        Err(e) => return Err(e).context("backtest failed"),
    };

    if json {
        let artifact = SummaryArtifact::from_run(&run);
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print_summary(&run);
    }

    if !no_save {
        let run_dir = save_artifacts(&run, &output_dir)?;
        tracing::info!(run_id = %run.run_id, dir = %run_dir.display(), "artifacts saved");
    }
    Ok(())
}

fn validate_cmd(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let run_id = config.run_id()?;
    println!("Config OK: {}", config_path.display());
    println!("Run ID:         {run_id}");
    println!("Symbols:        {}", config.backtest.symbols.join(", "));
    println!(
        "Period:         {} to {}",
        config.backtest.start_date, config.backtest.end_date
    );
    println!("Strategy:       {}", config.strategy.component_type);
    Ok(())
}

fn print_summary(run: &BacktestRun) {
    let stats = &run.report.summary;
    let counters = &run.report.run;

    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", run.run_id);
    println!("Symbols:        {}", run.config.backtest.symbols.join(", "));
    println!(
        "Period:         {} to {}",
        run.config.backtest.start_date, run.config.backtest.end_date
    );
    println!("Strategy:       {}", counters.strategy);
    println!("Venue:          {}", counters.venue);
    println!();
    println!("--- Events ---");
    println!("Heartbeats:     {}", counters.heartbeats);
    println!("Market:         {}", counters.market_events);
    println!("Signals:        {}", counters.signals);
    println!("Orders:         {}", counters.orders);
    println!("Fills:          {}", counters.fills);
    println!("Dropped:        {}", counters.dropped);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", stats.initial_capital);
    println!("Final Equity:   {:.2}", stats.final_equity);
    println!("Total Return:   {:.2}%", stats.total_return * 100.0);
    println!("Sharpe:         {}", stats.sharpe_display());
    println!("Max Drawdown:   {:.2}", stats.max_drawdown);
    println!("DD Duration:    {} bars", stats.max_drawdown_duration);
    println!("Commission:     {:.2}", stats.total_commission);

    match counters.stop_reason {
        StopReason::Completed => {}
        StopReason::Stopped => {
            println!();
            println!("WARNING: run was stopped before all bars were replayed");
        }
        StopReason::HeartbeatLimit => {
            println!();
            println!(
                "WARNING: heartbeat limit reached after {} heartbeats",
                counters.heartbeats
            );
        }
    }
    if counters.dropped > 0 {
        println!(
            "WARNING: {} event(s) dropped after handler errors (see log)",
            counters.dropped
        );
    }
}
