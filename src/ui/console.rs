//! Console renderer for backtest reports.

use crate::backtest::sweep::SweepOutcome;
use crate::backtest::BacktestResult;
use crate::config::strategy::GridStrategyConfig;
use crate::constants::{MAX_GRID_ROWS_RENDERED, SWEEP_LEADERBOARD_ROWS};
use crate::model::{OrderSide, TradeRecord};
use crate::strategy::common;

/// Console renderer for single-run and sweep reports.
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    /// Render a complete single-run report to stdout.
    pub fn render(run: &BacktestResult) {
        println!();
        println!("{}", "=".repeat(60));
        println!(" BACKTEST REPORT  (run {})", run.run_id);
        println!("{}", "=".repeat(60));

        println!();
        Self::render_config(&run.config);

        println!();
        println!("{}", "-".repeat(60));
        Self::render_performance(run);

        println!();
        println!("{}", "-".repeat(60));
        Self::render_level_activity(run);

        println!();
        println!("{}", "=".repeat(60));
        println!();
    }

    /// Render a sweep leaderboard followed by the winner's full report.
    pub fn render_sweep(outcome: &SweepOutcome) {
        println!();
        println!("{}", "=".repeat(60));
        println!(
            " PARAMETER SWEEP  ({} combinations, optimizing {})",
            outcome.results.len(),
            outcome.optimize
        );
        println!("{}", "=".repeat(60));
        println!();
        println!(
            "{:<4} | {:<6} | {:<19} | {:<5} | {:<9} | {:<9} | {:<7}",
            "RANK", "GRIDS", "RANGE", "LEV", "RETURN %", "MAX DD %", "SHARPE"
        );
        println!("{}", "-".repeat(76));

        for (rank, result) in outcome
            .ranked()
            .iter()
            .take(SWEEP_LEADERBOARD_ROWS)
            .enumerate()
        {
            let range = format!(
                "{:.2}-{:.2}",
                result.config.lower_price, result.config.upper_price
            );
            println!(
                "{:<4} | {:<6} | {:<19} | {:<5} | {:<9.2} | {:<9.2} | {:<7.2}",
                rank + 1,
                result.config.grid_count,
                range,
                result.config.leverage,
                result.metrics.total_return * 100.0,
                result.metrics.max_drawdown * 100.0,
                result.metrics.sharpe_ratio
            );
        }
        if outcome.results.len() > SWEEP_LEADERBOARD_ROWS {
            println!(
                "... ({} more combinations) ...",
                outcome.results.len() - SWEEP_LEADERBOARD_ROWS
            );
        }

        Self::render(outcome.best());
    }

    fn render_config(config: &GridStrategyConfig) {
        println!("CONFIGURATION");
        println!("Symbol:      {}", config.symbol);
        println!("Mode:        {}", config.mode);
        println!("Grid Type:   {:?}", config.grid_type);
        println!("Grid Count:  {}", config.grid_count);
        println!(
            "Range:       {:.6} - {:.6}",
            config.lower_price, config.upper_price
        );
        println!("Capital:     {:.3}", config.initial_capital);
        println!("Leverage:    {}x", config.leverage);
        println!("Fee Rate:    {:.5}", config.fee_rate);
        println!(
            "Funding:     {:.6} per {}h",
            config.funding_rate, config.funding_interval_hours
        );
    }

    fn render_performance(run: &BacktestResult) {
        let r = &run.result;
        let m = &run.metrics;

        println!("PERFORMANCE");
        println!(
            "Capital:     {:.4} -> {:.4}",
            r.initial_capital, r.final_capital
        );
        println!("Return:      {:.2}%", m.total_return * 100.0);
        println!("Annualized:  {:.2}%", m.annualized_return * 100.0);
        println!("Max DD:      {:.2}%", m.max_drawdown * 100.0);
        println!("Sharpe:      {:.3}", m.sharpe_ratio);
        println!(
            "Trades:      {} (win rate {:.1}%)",
            m.trade_count,
            m.win_rate * 100.0
        );
        println!("Realized:    {:.4}", r.realized_pnl);
        println!(
            "Fees:        {:.4} trading | {:.4} funding ({} settlements)",
            r.trading_fees, r.funding_fees, r.funding_settlements
        );
        if r.ending_net_position.abs() > 1e-9 {
            println!("Open Pos:    {:.6} net at end of run", r.ending_net_position);
        }
        if r.skipped_bars > 0 {
            println!("Skipped:     {} corrupt bars", r.skipped_bars);
        }
    }

    /// Per-level activity table aggregated from the trade list.
    fn render_level_activity(run: &BacktestResult) {
        let config = &run.config;
        let prices = common::calculate_grid_prices(
            config.grid_type,
            config.lower_price,
            config.upper_price,
            config.grid_count,
        );

        println!("GRID ACTIVITY ({} levels)", prices.len());
        println!(
            "{:<4} | {:<14} | {:<5} | {:<5} | {:<12} | {:<12}",
            "IDX", "PRICE", "BUYS", "SELLS", "VOLUME", "REALIZED"
        );
        println!("{}", "-".repeat(66));

        let rows: Vec<LevelActivity> = prices
            .iter()
            .enumerate()
            .map(|(level, &price)| LevelActivity::aggregate(level, price, &run.result.trades))
            .collect();

        // Long ladders get elided in the middle, like large order books.
        let half = MAX_GRID_ROWS_RENDERED / 2;
        let display: Vec<&LevelActivity> = if rows.len() > MAX_GRID_ROWS_RENDERED {
            rows.iter()
                .take(half)
                .chain(rows.iter().skip(rows.len() - half))
                .collect()
        } else {
            rows.iter().collect()
        };

        for row in display {
            println!(
                "{:<4} | {:<14.6} | {:<5} | {:<5} | {:<12.6} | {:<12.4}",
                row.level, row.price, row.buys, row.sells, row.volume, row.realized
            );
        }
        if rows.len() > MAX_GRID_ROWS_RENDERED {
            println!(
                "... (Hiding {} levels) ...",
                rows.len() - MAX_GRID_ROWS_RENDERED
            );
        }
    }
}

struct LevelActivity {
    level: usize,
    price: f64,
    buys: usize,
    sells: usize,
    volume: f64,
    realized: f64,
}

impl LevelActivity {
    fn aggregate(level: usize, price: f64, trades: &[TradeRecord]) -> Self {
        let mut buys = 0;
        let mut sells = 0;
        let mut volume = 0.0;
        let mut realized = 0.0;
        for trade in trades.iter().filter(|t| t.level == level) {
            match trade.side {
                OrderSide::Buy => buys += 1,
                OrderSide::Sell => sells += 1,
            }
            volume += trade.quantity;
            realized += trade.realized_pnl;
        }
        Self {
            level,
            price,
            buys,
            sells,
            volume,
            realized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(level: usize, side: OrderSide, quantity: f64, realized_pnl: f64) -> TradeRecord {
        TradeRecord {
            timestamp: 0,
            side,
            level,
            price: 100.0,
            quantity,
            fee: 0.0,
            realized_pnl,
            funding_fee: 0.0,
            net_position: 0.0,
        }
    }

    #[test]
    fn test_level_activity_aggregates_by_level() {
        let trades = vec![
            trade(0, OrderSide::Buy, 2.0, 0.0),
            trade(0, OrderSide::Buy, 2.0, 0.0),
            trade(1, OrderSide::Sell, 1.6, 40.0),
            trade(0, OrderSide::Sell, 2.0, 50.0),
        ];

        let row = LevelActivity::aggregate(0, 100.0, &trades);
        assert_eq!(row.buys, 2);
        assert_eq!(row.sells, 1);
        assert!((row.volume - 6.0).abs() < 1e-9);
        assert!((row.realized - 50.0).abs() < 1e-9);

        let empty = LevelActivity::aggregate(4, 200.0, &trades);
        assert_eq!(empty.buys + empty.sells, 0);
        assert_eq!(empty.volume, 0.0);
    }
}
