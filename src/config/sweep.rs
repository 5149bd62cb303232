use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backtest::metrics::PerformanceMetrics;
use crate::config::strategy::GridStrategyConfig;

/// Parameter ranges for an optimization sweep, the `[sweep]` table.
///
/// Any axis left empty falls back to the single value from the base
/// `[strategy]` table. Combinations that fail strategy validation
/// (for example a lower bound meeting an upper bound) are dropped
/// during expansion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub grid_counts: Vec<u32>,
    #[serde(default)]
    pub lower_prices: Vec<f64>,
    #[serde(default)]
    pub upper_prices: Vec<f64>,
    #[serde(default)]
    pub leverages: Vec<f64>,
    /// Statistic the sweep maximizes.
    #[serde(default)]
    pub optimize: OptimizeMetric,
}

/// Selection criterion for the best sweep combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeMetric {
    #[default]
    TotalReturn,
    AnnualizedReturn,
    MaxDrawdown,
    SharpeRatio,
    WinRate,
}

impl OptimizeMetric {
    /// Score where higher is always better. Drawdown is negated so the
    /// shallowest drawdown wins under the same max-selection.
    pub fn score(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            OptimizeMetric::TotalReturn => metrics.total_return,
            OptimizeMetric::AnnualizedReturn => metrics.annualized_return,
            OptimizeMetric::MaxDrawdown => -metrics.max_drawdown,
            OptimizeMetric::SharpeRatio => metrics.sharpe_ratio,
            OptimizeMetric::WinRate => metrics.win_rate,
        }
    }
}

impl fmt::Display for OptimizeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizeMetric::TotalReturn => "total_return",
            OptimizeMetric::AnnualizedReturn => "annualized_return",
            OptimizeMetric::MaxDrawdown => "max_drawdown",
            OptimizeMetric::SharpeRatio => "sharpe_ratio",
            OptimizeMetric::WinRate => "win_rate",
        };
        write!(f, "{}", name)
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(&count) = self.grid_counts.iter().find(|&&c| c < 2) {
            return Err(anyhow!("Sweep grid count {} must be at least 2.", count));
        }
        if let Some(&price) = self.lower_prices.iter().find(|&&p| p <= 0.0) {
            return Err(anyhow!("Sweep lower price {} must be positive.", price));
        }
        if let Some(&price) = self.upper_prices.iter().find(|&&p| p <= 0.0) {
            return Err(anyhow!("Sweep upper price {} must be positive.", price));
        }
        if let Some(&lev) = self.leverages.iter().find(|&&l| l < 1.0) {
            return Err(anyhow!("Sweep leverage {} must be at least 1.", lev));
        }
        Ok(())
    }

    /// Number of raw combinations before invalid ones are dropped.
    pub fn raw_size(&self) -> usize {
        self.grid_counts.len().max(1)
            * self.lower_prices.len().max(1)
            * self.upper_prices.len().max(1)
            * self.leverages.len().max(1)
    }

    /// Expands the cartesian product of all supplied axes over the base
    /// strategy. Combinations failing validation are skipped.
    pub fn expand(&self, base: &GridStrategyConfig) -> Vec<GridStrategyConfig> {
        let grid_counts = fallback(&self.grid_counts, base.grid_count);
        let lower_prices = fallback(&self.lower_prices, base.lower_price);
        let upper_prices = fallback(&self.upper_prices, base.upper_price);
        let leverages = fallback(&self.leverages, base.leverage);

        let mut configs = Vec::new();
        for &grid_count in &grid_counts {
            for &lower_price in &lower_prices {
                for &upper_price in &upper_prices {
                    for &leverage in &leverages {
                        let mut candidate = base.clone();
                        candidate.grid_count = grid_count;
                        candidate.lower_price = lower_price;
                        candidate.upper_price = upper_price;
                        candidate.leverage = leverage;
                        if candidate.validate().is_err() {
                            log::debug!(
                                "[SWEEP] Skipping invalid combination: count {} range [{}, {}] leverage {}",
                                grid_count,
                                lower_price,
                                upper_price,
                                leverage
                            );
                            continue;
                        }
                        configs.push(candidate);
                    }
                }
            }
        }
        configs
    }
}

fn fallback<T: Copy>(axis: &[T], base: T) -> Vec<T> {
    if axis.is_empty() {
        vec![base]
    } else {
        axis.to_vec()
    }
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

    #[test]
    fn test_empty_axes_expand_to_base_alone() {
        let sweep = SweepConfig::default();
        let configs = sweep.expand(&base_config());
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].grid_count, 5);
        assert_eq!(configs[0].lower_price, 100.0);
    }

    #[test]
    fn test_cartesian_expansion() {
        let sweep = SweepConfig {
            grid_counts: vec![5, 10],
            leverages: vec![1.0, 2.0, 3.0],
            ..Default::default()
        };
        assert_eq!(sweep.raw_size(), 6);
        let configs = sweep.expand(&base_config());
        assert_eq!(configs.len(), 6);
        // Unswept axes keep the base value everywhere.
        assert!(configs.iter().all(|c| c.lower_price == 100.0));
        assert!(configs.iter().all(|c| c.upper_price == 200.0));
    }

    #[test]
    fn test_invalid_combinations_skipped() {
        let sweep = SweepConfig {
            lower_prices: vec![100.0, 250.0],
            upper_prices: vec![200.0, 300.0],
            ..Default::default()
        };
        let configs = sweep.expand(&base_config());
        // (250, 200) has lower above upper and is dropped.
        assert_eq!(configs.len(), 3);
        assert!(configs.iter().all(|c| c.upper_price > c.lower_price));
    }

    #[test]
    fn test_validate_rejects_bad_axis_values() {
        let sweep = SweepConfig {
            grid_counts: vec![5, 1],
            ..Default::default()
        };
        let err = sweep.validate().unwrap_err();
        assert_eq!(err.to_string(), "Sweep grid count 1 must be at least 2.");

        let sweep = SweepConfig {
            leverages: vec![0.5],
            ..Default::default()
        };
        let err = sweep.validate().unwrap_err();
        assert_eq!(err.to_string(), "Sweep leverage 0.5 must be at least 1.");
    }

    #[test]
    fn test_optimize_metric_parses_from_toml() {
        let sweep: SweepConfig = toml::from_str(
            r#"
            grid_counts = [5, 10, 20]
            optimize = "sharpe_ratio"
            "#,
        )
        .unwrap();
        assert_eq!(sweep.optimize, OptimizeMetric::SharpeRatio);
        assert_eq!(sweep.grid_counts, vec![5, 10, 20]);
        assert!(sweep.leverages.is_empty());
    }

    #[test]
    fn test_optimize_metric_defaults_to_total_return() {
        let sweep: SweepConfig = toml::from_str("grid_counts = [5]").unwrap();
        assert_eq!(sweep.optimize, OptimizeMetric::TotalReturn);
    }

    #[test]
    fn test_drawdown_score_prefers_shallower() {
        let shallow = PerformanceMetrics {
            total_return: 0.0,
            annualized_return: 0.0,
            max_drawdown: 0.05,
            sharpe_ratio: 0.0,
            win_rate: 0.0,
            trade_count: 0,
            trading_fees: 0.0,
            funding_fees: 0.0,
        };
        let mut deep = shallow.clone();
        deep.max_drawdown = 0.25;
        let metric = OptimizeMetric::MaxDrawdown;
        assert!(metric.score(&shallow) > metric.score(&deep));
    }
}
