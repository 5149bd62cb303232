//! One-shot backtest orchestration.
//!
//! `BacktestEngine` drives a `StrategyEngine` over a prepared bar sequence
//! and attaches performance metrics to the raw run output. The sweep module
//! fans the same bars out across many configurations.

pub mod metrics;
pub mod sweep;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::strategy::GridStrategyConfig;
use crate::engine::{StrategyEngine, StrategyResult};
use crate::error::ConfigError;
use crate::model::Bar;

use self::metrics::PerformanceMetrics;

/// Full output of a single run: the configuration that produced it, the raw
/// engine output, and the derived statistics.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub run_id: Uuid,
    pub config: GridStrategyConfig,
    pub result: StrategyResult,
    pub metrics: PerformanceMetrics,
}

/// Runs strategies over one shared, immutable bar sequence.
pub struct BacktestEngine<'a> {
    bars: &'a [Bar],
}

impl<'a> BacktestEngine<'a> {
    pub fn new(bars: &'a [Bar]) -> Self {
        Self { bars }
    }

    /// Runs one configuration over the full sequence. Fails only on an
    /// invalid configuration, before any bar is touched.
    pub fn run(&self, config: &GridStrategyConfig) -> Result<BacktestResult, ConfigError> {
        let run_id = Uuid::new_v4();
        info!(
            "[BACKTEST] Run {} starting: {} {} grid, {} levels over [{}, {}], {} bars",
            run_id,
            config.symbol,
            config.mode,
            config.grid_count,
            config.lower_price,
            config.upper_price,
            self.bars.len()
        );

        let mut engine = StrategyEngine::new(config.clone())?;
        for bar in self.bars {
            engine.process_bar(bar);
        }
        let result = engine.into_result();
        let metrics = PerformanceMetrics::from_result(&result);

        info!(
            "[BACKTEST] Run {} done: return {:.2}%, {} trades, max drawdown {:.2}%",
            run_id,
            metrics.total_return * 100.0,
            metrics.trade_count,
            metrics.max_drawdown * 100.0
        );

        Ok(BacktestResult {
            run_id,
            config: config.clone(),
            result,
            metrics,
        })
    }
}
