//! Deterministic bar-by-bar simulation engine.
//!
//! The engine owns the order book, per-level positions, margin ledger, PnL
//! totals, and funding cadence, and advances them one OHLCV bar at a time.
//! Everything here is pure and synchronous; market data arrives as input and
//! results leave as plain values.

pub mod funding;
pub mod margin;
pub mod pnl;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::strategy::GridStrategyConfig;
use crate::constants::QTY_EPSILON;
use crate::error::{ConfigError, EngineError};
use crate::model::{Bar, OrderFill, TradeRecord};
use crate::strategy::orders::OrderManager;
use crate::strategy::positions::PositionManager;
use crate::strategy::{common, ModePolicy};

use self::funding::FundingFeeCalculator;
use self::margin::MarginCalculator;
use self::pnl::PnLCalculator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No bar seen yet; the grid is not seeded.
    Uninitialized,
    /// First sane bar consumed: grid seeded, initial orders resting, no
    /// trading performed yet.
    Initialized,
    /// Trading bars.
    Running,
    /// Run finished; further bars are ignored.
    Terminal,
}

/// Raw output of one strategy run, before metrics are layered on top.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub realized_pnl: f64,
    pub trading_fees: f64,
    /// Absolute funding drag (non-negative).
    pub funding_fees: f64,
    /// Signed funding cash flow as applied to capital.
    pub net_funding: f64,
    pub funding_settlements: u32,
    pub equity_curve: Vec<f64>,
    pub timestamps: Vec<i64>,
    pub trades: Vec<TradeRecord>,
    pub skipped_bars: u32,
    pub ending_net_position: f64,
}

/// Grid strategy simulator: one instance per run.
pub struct StrategyEngine {
    config: GridStrategyConfig,
    policy: &'static dyn ModePolicy,
    orders: OrderManager,
    positions: PositionManager,
    margin: MarginCalculator,
    pnl: PnLCalculator,
    funding: FundingFeeCalculator,
    capital: f64,
    state: EngineState,
    equity_curve: Vec<f64>,
    timestamps: Vec<i64>,
    trades: Vec<TradeRecord>,
    skipped_bars: u32,
}

impl StrategyEngine {
    /// Validates the configuration and assembles the component set. No bar
    /// has been seen afterwards; the engine is `Uninitialized`.
    pub fn new(config: GridStrategyConfig) -> Result<Self, ConfigError> {
        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let prices = common::calculate_grid_prices(
            config.grid_type,
            config.lower_price,
            config.upper_price,
            config.grid_count,
        );
        let policy = config.mode.policy();
        let margin = MarginCalculator::new(config.leverage);
        let funding = FundingFeeCalculator::new(config.funding_interval_ms(), config.funding_rate);
        let capital = config.initial_capital;

        Ok(Self {
            orders: OrderManager::new(prices),
            positions: PositionManager::new(),
            margin,
            pnl: PnLCalculator::new(),
            funding,
            capital,
            state: EngineState::Uninitialized,
            equity_curve: Vec::new(),
            timestamps: Vec::new(),
            trades: Vec::new(),
            skipped_bars: 0,
            policy,
            config,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn skipped_bars(&self) -> u32 {
        self.skipped_bars
    }

    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    /// Consumes one bar. The first sane bar seeds the grid at its close and
    /// performs no trading; subsequent bars settle funding, sweep fills, and
    /// append an equity point. A corrupt bar is skipped wholesale.
    pub fn process_bar(&mut self, bar: &Bar) {
        if self.state == EngineState::Terminal {
            warn!("[ENGINE] Bar @ {} ignored: run already finished", bar.timestamp);
            return;
        }
        if !bar.is_sane() {
            self.skipped_bars += 1;
            warn!(
                "[ENGINE] {}",
                EngineError::CorruptBar {
                    timestamp: bar.timestamp,
                    high: bar.high,
                    low: bar.low,
                }
            );
            return;
        }

        match self.state {
            EngineState::Uninitialized => {
                self.seed(bar);
                self.state = EngineState::Initialized;
            }
            EngineState::Initialized | EngineState::Running => {
                self.state = EngineState::Running;
                self.step(bar);
            }
            // Returned early above.
            EngineState::Terminal => {}
        }
    }

    /// Marks the run finished. Idempotent.
    pub fn finish(&mut self) {
        if self.state != EngineState::Terminal {
            info!(
                "[ENGINE] Run finished: {} bars, {} trades, {} skipped, capital {:.4}",
                self.equity_curve.len(),
                self.trades.len(),
                self.skipped_bars,
                self.capital
            );
            self.state = EngineState::Terminal;
        }
    }

    /// Finishes the run and hands the accumulated output over.
    pub fn into_result(mut self) -> StrategyResult {
        self.finish();
        StrategyResult {
            initial_capital: self.config.initial_capital,
            final_capital: self.capital,
            realized_pnl: self.pnl.realized_total(),
            trading_fees: self.pnl.trading_fees_total(),
            funding_fees: self.funding.total_fees(),
            net_funding: self.funding.net_flow(),
            funding_settlements: self.funding.settlement_count(),
            equity_curve: self.equity_curve,
            timestamps: self.timestamps,
            trades: self.trades,
            skipped_bars: self.skipped_bars,
            ending_net_position: self.positions.net_position(),
        }
    }

    // --- Per-bar internals ---

    fn seed(&mut self, bar: &Bar) {
        let seed_price = bar.close;
        let placed = self.orders.place_initial_orders(
            seed_price,
            self.config.per_level_notional(),
            self.policy,
        );
        info!(
            "[ENGINE] {} grid seeded @ {}: {} levels, {} initial orders",
            self.config.mode,
            seed_price,
            self.orders.grid_count(),
            placed
        );
        self.record_equity(bar);
    }

    fn step(&mut self, bar: &Bar) {
        // 1. Funding settlement, valued at the bar's open.
        let mut funding_attr = self.settle_funding(bar);

        // 2. Sweep the book once; orders placed below do not re-fill this bar.
        let fills = self.orders.check_order_fills(bar);

        // 3. Apply each fill in turn against positions, margin, and PnL.
        for fill in &fills {
            self.apply_fill(fill, bar.timestamp, &mut funding_attr);
        }

        // 4. Mark to the close.
        self.record_equity(bar);

        let used = self.margin.used_margin();
        if used > self.capital + 1e-6 {
            warn!(
                "[ENGINE] Used margin {:.4} exceeds capital {:.4} after bar @ {}",
                used, self.capital, bar.timestamp
            );
        }
    }

    /// Charges funding if an interval boundary has passed. Returns the fee
    /// applied this bar so the first trade record can carry it.
    fn settle_funding(&mut self, bar: &Bar) -> f64 {
        if !self.funding.should_settle(bar.timestamp) {
            return 0.0;
        }
        let net = self.positions.net_position();
        let fee = if net.abs() < QTY_EPSILON {
            0.0
        } else {
            self.funding.funding_fee(net, bar.open)
        };
        self.capital -= fee;
        self.funding.settle(bar.timestamp, fee);
        if fee != 0.0 {
            debug!(
                "[FUNDING] Charged {:.8} on net position {:.8} @ {}",
                fee, net, bar.open
            );
        }
        fee
    }

    fn apply_fill(&mut self, fill: &OrderFill, timestamp: i64, funding_attr: &mut f64) {
        let grid_count = self.orders.grid_count();

        // Pair against the adjacent level first; failing that, net against
        // opposite inventory resident at the fill's own level.
        let close_level = self
            .positions
            .find_matching_position(fill.level, fill.side, self.policy, grid_count)
            .or_else(|| {
                if self.positions.closable_at(fill.level, fill.side) {
                    Some(fill.level)
                } else {
                    None
                }
            });

        let mut closed_qty = 0.0;
        let mut realized = 0.0;
        let mut fee = 0.0;

        if let Some(level) = close_level {
            if let Some(lot) = self.positions.reduce(level, fill.quantity) {
                let released = self.margin.required_margin(lot.quantity, lot.entry_price);
                self.margin.release(released);
                realized =
                    PnLCalculator::realized(lot.was_long, lot.entry_price, fill.price, lot.quantity);
                self.capital += realized;
                self.pnl.record_realized(realized);

                let close_fee = PnLCalculator::fee(fill.price, lot.quantity, self.config.fee_rate);
                self.capital -= close_fee;
                self.pnl.record_fee(close_fee);
                fee += close_fee;
                closed_qty = lot.quantity;

                debug!(
                    "[ENGINE] {} @ {} closed {:.8} against level {}: pnl {:.6}",
                    fill.side, fill.price, closed_qty, level, realized
                );
            }
        }

        // Open whatever the close did not consume at the fill's own level.
        let open_qty = fill.quantity - closed_qty;
        let mut opened_qty = 0.0;
        if open_qty > QTY_EPSILON {
            let required = self.margin.required_margin(open_qty, fill.price);
            let open_fee = PnLCalculator::fee(fill.price, open_qty, self.config.fee_rate);
            // The fee is about to reduce capital; headroom must survive it.
            match self.margin.allocate(required, self.capital - open_fee) {
                Ok(()) => {
                    self.capital -= open_fee;
                    self.pnl.record_fee(open_fee);
                    fee += open_fee;
                    self.positions
                        .open(fill.level, fill.side, open_qty, fill.price, timestamp);
                    opened_qty = open_qty;
                }
                Err(e) => {
                    warn!("[ENGINE] Trade rejected at level {}: {}", fill.level, e);
                }
            }
        }

        let executed_qty = closed_qty + opened_qty;
        if executed_qty < QTY_EPSILON {
            // Fully rejected: the order has left the book, nothing else moved.
            return;
        }

        self.trades.push(TradeRecord {
            timestamp,
            side: fill.side,
            level: fill.level,
            price: fill.price,
            quantity: executed_qty,
            fee,
            realized_pnl: realized,
            funding_fee: std::mem::take(funding_attr),
            net_position: self.positions.net_position(),
        });

        // Re-arm the grid with the executed quantity.
        let counter_fill = OrderFill {
            quantity: executed_qty,
            ..*fill
        };
        self.orders.place_counter_order(&counter_fill, self.policy);
    }

    fn record_equity(&mut self, bar: &Bar) {
        let unrealized = self.positions.unrealized_pnl(bar.close);
        self.equity_curve
            .push(PnLCalculator::equity(self.capital, unrealized));
        self.timestamps.push(bar.timestamp);
    }
}
