/// Close and mark-to-market arithmetic plus the run's realized totals.
///
/// Pure bookkeeping. Owns no orders, positions, or margin; the engine feeds
/// it closed slices and fees and reads the totals back out.
#[derive(Debug, Default)]
pub struct PnLCalculator {
    realized_pnl: f64,
    trading_fees: f64,
}

impl PnLCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Realized PnL for a closed slice: longs earn `close - entry`, shorts
    /// `entry - close`, scaled by the closed quantity.
    pub fn realized(was_long: bool, entry_price: f64, close_price: f64, quantity: f64) -> f64 {
        if was_long {
            (close_price - entry_price) * quantity
        } else {
            (entry_price - close_price) * quantity
        }
    }

    /// Proportional fee charged on a fill, opens and closes alike.
    pub fn fee(price: f64, quantity: f64, fee_rate: f64) -> f64 {
        price * quantity * fee_rate
    }

    /// Account equity: cash capital plus mark-to-market of open entries.
    pub fn equity(capital: f64, unrealized: f64) -> f64 {
        capital + unrealized
    }

    pub fn record_realized(&mut self, pnl: f64) {
        self.realized_pnl += pnl;
    }

    pub fn record_fee(&mut self, fee: f64) {
        self.trading_fees += fee;
    }

    /// Accumulated grid profit across all closed slices.
    pub fn realized_total(&self) -> f64 {
        self.realized_pnl
    }

    pub fn trading_fees_total(&self) -> f64 {
        self.trading_fees
    }
}
