//! Parallel parameter sweep over strategy configurations.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::backtest::{BacktestEngine, BacktestResult};
use crate::config::strategy::GridStrategyConfig;
use crate::config::sweep::{OptimizeMetric, SweepConfig};
use crate::error::ConfigError;
use crate::model::Bar;

/// All sweep results plus the index of the winning combination.
///
/// Result order matches expansion order regardless of which worker
/// finished first.
#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub optimize: OptimizeMetric,
    pub best_index: usize,
    pub results: Vec<BacktestResult>,
}

impl SweepOutcome {
    pub fn best(&self) -> &BacktestResult {
        &self.results[self.best_index]
    }

    /// Results sorted best-first by the sweep's own criterion.
    pub fn ranked(&self) -> Vec<&BacktestResult> {
        let mut sorted: Vec<&BacktestResult> = self.results.iter().collect();
        sorted.sort_by(|a, b| {
            self.optimize
                .score(&b.metrics)
                .partial_cmp(&self.optimize.score(&a.metrics))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }
}

/// Expands the sweep axes over the base strategy and runs every valid
/// combination, one independent engine per combination.
pub fn run_sweep(
    bars: &[Bar],
    base: &GridStrategyConfig,
    sweep: &SweepConfig,
) -> Result<SweepOutcome, ConfigError> {
    let configs = sweep.expand(base);
    if configs.is_empty() {
        return Err(ConfigError::Validation(
            "Sweep produced no valid combinations.".to_string(),
        ));
    }
    info!(
        "[SWEEP] Running {} combinations ({} raw), optimizing {}",
        configs.len(),
        sweep.raw_size(),
        sweep.optimize
    );

    let engine = BacktestEngine::new(bars);
    let results: Vec<BacktestResult> = configs
        .par_iter()
        .map(|config| engine.run(config))
        .collect::<Result<Vec<_>, _>>()?;

    let best_index = results
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            sweep
                .optimize
                .score(&a.metrics)
                .partial_cmp(&sweep.optimize.score(&b.metrics))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(index, _)| index)
        .unwrap_or(0);

    let best = &results[best_index];
    info!(
        "[SWEEP] Best combination: count {} range [{}, {}] leverage {} ({} = {:.4})",
        best.config.grid_count,
        best.config.lower_price,
        best.config.upper_price,
        best.config.leverage,
        sweep.optimize,
        sweep.optimize.score(&best.metrics)
    );

    Ok(SweepOutcome {
        optimize: sweep.optimize,
        best_index,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::types::{GridMode, GridType};

    fn base_config() -> GridStrategyConfig {
        GridStrategyConfig {
            symbol: "BTC".to_string(),
            mode: GridMode::Long,
            lower_price: 100.0,
            upper_price: 200.0,
            grid_count: 5,
            initial_capital: 1000.0,
            leverage: 1.0,
            fee_rate: 0.0,
            funding_rate: 0.0,
            funding_interval_hours: 8.0,
            grid_type: GridType::Arithmetic,
        }
    }

    fn bar(timestamp: i64, low: f64, high: f64, close: f64) -> Bar {
        Bar {
            timestamp,
            open: close,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    fn zigzag_bars() -> Vec<Bar> {
        vec![
            bar(1_000, 149.0, 151.0, 150.0),
            bar(2_000, 95.0, 120.0, 110.0),
            bar(3_000, 108.0, 155.0, 150.0),
            bar(4_000, 118.0, 152.0, 130.0),
            bar(5_000, 96.0, 132.0, 100.0),
            bar(6_000, 98.0, 160.0, 155.0),
        ]
    }

    #[test]
    fn test_results_follow_expansion_order() {
        let bars = zigzag_bars();
        let sweep = SweepConfig {
            grid_counts: vec![3, 5, 9],
            ..Default::default()
        };
        let outcome = run_sweep(&bars, &base_config(), &sweep).unwrap();

        assert_eq!(outcome.results.len(), 3);
        let counts: Vec<u32> = outcome.results.iter().map(|r| r.config.grid_count).collect();
        assert_eq!(counts, vec![3, 5, 9]);
    }

    #[test]
    fn test_best_has_max_score() {
        let bars = zigzag_bars();
        let sweep = SweepConfig {
            grid_counts: vec![3, 5, 9],
            leverages: vec![1.0, 2.0],
            ..Default::default()
        };
        let outcome = run_sweep(&bars, &base_config(), &sweep).unwrap();

        let best_score = sweep.optimize.score(&outcome.best().metrics);
        for result in &outcome.results {
            assert!(sweep.optimize.score(&result.metrics) <= best_score + 1e-12);
        }
    }

    #[test]
    fn test_ranked_is_descending() {
        let bars = zigzag_bars();
        let sweep = SweepConfig {
            grid_counts: vec![3, 5, 9],
            optimize: OptimizeMetric::SharpeRatio,
            ..Default::default()
        };
        let outcome = run_sweep(&bars, &base_config(), &sweep).unwrap();

        let ranked = outcome.ranked();
        assert_eq!(ranked.len(), 3);
        for pair in ranked.windows(2) {
            assert!(
                sweep.optimize.score(&pair[0].metrics)
                    >= sweep.optimize.score(&pair[1].metrics)
            );
        }
        assert_eq!(ranked[0].run_id, outcome.best().run_id);
    }

    #[test]
    fn test_all_invalid_combinations_is_error() {
        let bars = zigzag_bars();
        let sweep = SweepConfig {
            lower_prices: vec![300.0],
            upper_prices: vec![200.0],
            ..Default::default()
        };
        let err = run_sweep(&bars, &base_config(), &sweep).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_combinations_are_independent() {
        let bars = zigzag_bars();
        let sweep = SweepConfig {
            grid_counts: vec![5, 5],
            ..Default::default()
        };
        let outcome = run_sweep(&bars, &base_config(), &sweep).unwrap();

        // Identical configs produce identical numbers from separate engines.
        let a = &outcome.results[0];
        let b = &outcome.results[1];
        assert_eq!(a.result.final_capital, b.result.final_capital);
        assert_eq!(a.result.trades.len(), b.result.trades.len());
        assert_eq!(a.result.equity_curve, b.result.equity_curve);
        assert_ne!(a.run_id, b.run_id);
    }
}
