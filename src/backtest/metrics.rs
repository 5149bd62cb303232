//! Performance statistics computed after a run.
//!
//! Every metric is a pure function over the equity curve, timestamp list,
//! or trade list. Nothing here touches the engine.

use serde::{Deserialize, Serialize};

use crate::constants::{DAYS_PER_YEAR, MS_PER_DAY, TRADING_DAYS_PER_YEAR};
use crate::engine::StrategyResult;
use crate::model::TradeRecord;

/// Aggregate statistics for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// (final - initial) / initial.
    pub total_return: f64,
    /// Total return compounded to a 365-day year over the elapsed
    /// calendar time of the bar sequence.
    pub annualized_return: f64,
    /// Worst peak-to-trough decline as a positive fraction.
    pub max_drawdown: f64,
    /// Mean over stdev of per-bar returns, scaled by sqrt(252).
    pub sharpe_ratio: f64,
    /// Fraction of trades with positive realized PnL.
    pub win_rate: f64,
    pub trade_count: usize,
    pub trading_fees: f64,
    pub funding_fees: f64,
}

impl PerformanceMetrics {
    pub fn from_result(result: &StrategyResult) -> Self {
        Self {
            total_return: total_return(&result.equity_curve),
            annualized_return: annualized_return(&result.equity_curve, &result.timestamps),
            max_drawdown: max_drawdown(&result.equity_curve),
            sharpe_ratio: sharpe_ratio(&result.equity_curve),
            win_rate: win_rate(&result.trades),
            trade_count: result.trades.len(),
            trading_fees: result.trading_fees,
            funding_fees: result.funding_fees,
        }
    }
}

/// Total return as a fraction of starting equity.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    if initial <= 0.0 {
        return 0.0;
    }
    (equity_curve[equity_curve.len() - 1] - initial) / initial
}

/// Compounds the total return to a 365-day year.
///
/// Elapsed time comes from the first and last bar timestamps, so the figure
/// reflects calendar time rather than bar count. Returns 0.0 when fewer
/// than two bars were processed or no time elapsed; a total loss of 100%
/// or more annualizes to -1.0.
pub fn annualized_return(equity_curve: &[f64], timestamps: &[i64]) -> f64 {
    let total = total_return(equity_curve);
    if timestamps.len() < 2 {
        return 0.0;
    }
    let elapsed_days =
        (timestamps[timestamps.len() - 1] - timestamps[0]) as f64 / MS_PER_DAY as f64;
    if elapsed_days <= 0.0 {
        return 0.0;
    }
    let base = 1.0 + total;
    if base <= 0.0 {
        return -1.0;
    }
    base.powf(DAYS_PER_YEAR / elapsed_days) - 1.0
}

/// Maximum drawdown as a positive fraction of the running peak.
///
/// 0.15 means equity fell 15% below its best level at some point.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0];
    let mut max_dd = 0.0_f64;
    for &value in equity_curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio over per-bar returns.
///
/// Returns 0.0 for fewer than two returns or zero variance.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Fraction of trades whose realized PnL is positive. 0.0 with no trades.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.realized_pnl > 0.0).count();
    winners as f64 / trades.len() as f64
}

// --- Helpers ---

/// Simple per-bar returns from an equity curve.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderSide;

    const DAY_MS: i64 = 86_400_000;

    fn trade_with_pnl(realized_pnl: f64) -> TradeRecord {
        TradeRecord {
            timestamp: 0,
            side: OrderSide::Sell,
            level: 1,
            price: 125.0,
            quantity: 1.0,
            fee: 0.0,
            realized_pnl,
            funding_fee: 0.0,
            net_position: 0.0,
        }
    }

    #[test]
    fn test_total_return_basic() {
        let eq = vec![1000.0, 1050.0, 1100.0];
        assert!((total_return(&eq) - 0.1).abs() < 1e-10);

        let eq = vec![1000.0, 950.0, 900.0];
        assert!((total_return(&eq) - (-0.1)).abs() < 1e-10);
    }

    #[test]
    fn test_total_return_degenerate() {
        assert_eq!(total_return(&[]), 0.0);
        assert_eq!(total_return(&[1000.0]), 0.0);
        assert_eq!(total_return(&[1000.0, 1000.0]), 0.0);
    }

    #[test]
    fn test_annualized_return_one_year_identity() {
        // Exactly 365 days elapsed: annualized equals total.
        let eq = vec![1000.0, 1100.0];
        let ts = vec![0, 365 * DAY_MS];
        assert!((annualized_return(&eq, &ts) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_annualized_return_half_year_compounds() {
        // 10% over 182.5 days compounds to (1.1)^2 - 1 = 21%.
        let eq = vec![1000.0, 1100.0];
        let ts = vec![0, 365 * DAY_MS / 2];
        assert!((annualized_return(&eq, &ts) - 0.21).abs() < 1e-10);
    }

    #[test]
    fn test_annualized_return_degenerate() {
        assert_eq!(annualized_return(&[1000.0], &[0]), 0.0);
        // Same timestamp for first and last bar.
        assert_eq!(annualized_return(&[1000.0, 1100.0], &[5, 5]), 0.0);
        // Wiped out: base of the power is non-positive.
        let eq = vec![1000.0, -50.0];
        let ts = vec![0, 30 * DAY_MS];
        assert_eq!(annualized_return(&eq, &ts), -1.0);
    }

    #[test]
    fn test_max_drawdown_positive_fraction() {
        // Peak 1100, trough 900: (1100 - 900) / 1100.
        let eq = vec![1000.0, 1100.0, 900.0, 950.0];
        let expected = 200.0 / 1100.0;
        assert!((max_drawdown(&eq) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_max_drawdown_tracks_later_peaks() {
        // Second peak 1200 with drop to 1080 is the deeper drawdown.
        let eq = vec![1000.0, 1050.0, 1000.0, 1200.0, 1080.0];
        assert!((max_drawdown(&eq) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_max_drawdown_monotonic_is_zero() {
        let eq: Vec<f64> = (0..50).map(|i| 1000.0 + i as f64).collect();
        assert_eq!(max_drawdown(&eq), 0.0);
        assert_eq!(max_drawdown(&[1000.0; 50]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_sharpe_zero_variance_is_zero() {
        assert_eq!(sharpe_ratio(&[1000.0; 20]), 0.0);
        // Constant growth rate also has zero stdev.
        let mut eq = vec![1000.0];
        for i in 1..20 {
            eq.push(eq[i - 1] * 1.001);
        }
        assert_eq!(sharpe_ratio(&eq), 0.0);
        assert_eq!(sharpe_ratio(&[1000.0]), 0.0);
    }

    #[test]
    fn test_sharpe_positive_for_rising_uneven_curve() {
        let mut eq = vec![1000.0];
        for i in 1..100 {
            let r = if i % 2 == 0 { 1.002 } else { 1.0005 };
            eq.push(eq[i - 1] * r);
        }
        assert!(sharpe_ratio(&eq) > 0.0);
    }

    #[test]
    fn test_sharpe_uses_sample_std() {
        // Two returns +10% and -10%: mean 0, sample std sqrt(0.02).
        let eq = vec![100.0, 110.0, 99.0];
        let s = sharpe_ratio(&eq);
        assert!(s.abs() < 1e-9, "zero-mean returns give Sharpe ~0, got {s}");

        // Returns 10% and 0%: mean 0.05, sample std sqrt(0.005).
        let eq = vec![100.0, 110.0, 110.0];
        let expected = (0.05 / 0.005_f64.sqrt()) * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&eq) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_win_rate_counts_positive_realized_only() {
        let trades = vec![
            trade_with_pnl(25.0),
            trade_with_pnl(-10.0),
            trade_with_pnl(0.0),
            trade_with_pnl(40.0),
        ];
        assert!((win_rate(&trades) - 0.5).abs() < 1e-10);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn test_bar_returns() {
        let eq = vec![100.0, 110.0, 99.0];
        let r = bar_returns(&eq);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-10);
        assert!((r[1] - (-0.1)).abs() < 1e-10);
        assert!(bar_returns(&[100.0]).is_empty());
    }
}
