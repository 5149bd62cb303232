use anyhow::{Context, Result};
use clap::Parser;
use gridlab::backtest::sweep::{run_sweep, SweepOutcome};
use gridlab::backtest::{BacktestEngine, BacktestResult};
use gridlab::config::{load_config, sample_config};
use gridlab::data::load_bars;
use gridlab::logging::export_trades;
use gridlab::ui::console::ConsoleRenderer;
use log::{info, warn};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Perpetual grid strategy backtester", long_about = None)]
struct Args {
    /// Strategy configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OHLCV bar data file (CSV)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Run the [sweep] table from the config instead of a single backtest
    #[arg(long)]
    sweep: bool,

    /// Directory for the trade CSV and result JSON exports
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

fn main() -> Result<()> {
    // ---------------------------------------------------------
    // 1. Setup Logging (Tracing)
    // ---------------------------------------------------------
    let file_appender = tracing_appender::rolling::daily("logs", "gridlab.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Console Layer (Env Filter)
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("gridlab=debug".parse().unwrap()),
        );

    // File Layer (Simple Text)
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_target(false)
        .with_filter(tracing_subscriber::EnvFilter::new("info,gridlab=debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    let args = Args::parse();

    if args.print_sample_config {
        print!("{}", sample_config());
        return Ok(());
    }

    let config_path = args.config.ok_or_else(|| {
        anyhow::anyhow!("Config file is required unless --print-sample-config is used")
    })?;
    let data_path = args.data.ok_or_else(|| {
        anyhow::anyhow!("Data file is required unless --print-sample-config is used")
    })?;

    info!("Loading config from: {}", config_path.display());
    let config = load_config(&config_path)?;

    info!("Loading bars from: {}", data_path.display());
    let bars = load_bars(&data_path)?;
    if bars.is_empty() {
        warn!("Bar file contains no data rows; the run will produce an empty result");
    }

    if args.sweep {
        let sweep_config = config.sweep.as_ref().ok_or_else(|| {
            anyhow::anyhow!("--sweep requires a [sweep] table in the config file")
        })?;
        let outcome = run_sweep(&bars, &config.strategy, sweep_config)?;
        ConsoleRenderer::render_sweep(&outcome);
        if let Some(dir) = &args.export_dir {
            export_sweep(dir, &outcome)?;
        }
    } else {
        let engine = BacktestEngine::new(&bars);
        let run = engine.run(&config.strategy)?;
        ConsoleRenderer::render(&run);
        if let Some(dir) = &args.export_dir {
            export_run(dir, &run)?;
        }
    }

    Ok(())
}

/// Writes `trades_<run-id>.csv` and `result_<run-id>.json` into `dir`.
fn export_run(dir: &Path, run: &BacktestResult) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let trades_path = dir.join(format!("trades_{}.csv", run.run_id));
    export_trades(&trades_path, &run.config.symbol, &run.result.trades)?;

    let result_path = dir.join(format!("result_{}.json", run.run_id));
    let json = serde_json::to_string_pretty(run).context("Failed to serialize result")?;
    std::fs::write(&result_path, json)
        .with_context(|| format!("Failed to write {}", result_path.display()))?;

    info!(
        "Exported {} and {}",
        trades_path.display(),
        result_path.display()
    );
    Ok(())
}

/// Exports the winning run plus the full sweep outcome.
fn export_sweep(dir: &Path, outcome: &SweepOutcome) -> Result<()> {
    export_run(dir, outcome.best())?;

    let path = dir.join(format!("sweep_{}.json", outcome.best().run_id));
    let json = serde_json::to_string_pretty(outcome).context("Failed to serialize sweep")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Exported {}", path.display());
    Ok(())
}
