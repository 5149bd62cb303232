use tracing::debug;

/// Funding settlement cadence and totals for one run.
///
/// The watermark seeds lazily: the FIRST settlement check records the bar
/// timestamp and reports not-due, so a backtest joining mid-interval never
/// charges funding at its opening bar.
pub struct FundingFeeCalculator {
    interval_ms: i64,
    funding_rate: f64,
    /// Last settlement timestamp in epoch ms; 0 means unset.
    last_settlement: i64,
    /// Absolute fee drag, reported in results.
    total_fees_abs: f64,
    /// Signed cash flow actually applied to capital.
    net_flow: f64,
    settlement_count: u32,
}

impl FundingFeeCalculator {
    pub fn new(interval_ms: i64, funding_rate: f64) -> Self {
        Self {
            interval_ms,
            funding_rate,
            last_settlement: 0,
            total_fees_abs: 0.0,
            net_flow: 0.0,
            settlement_count: 0,
        }
    }

    /// True when a settlement interval has elapsed since the watermark.
    /// Seeds the watermark on first call and reports false.
    pub fn should_settle(&mut self, now: i64) -> bool {
        if self.last_settlement == 0 {
            self.last_settlement = now;
            debug!("[FUNDING] Watermark seeded @ {}", now);
            return false;
        }
        now - self.last_settlement >= self.interval_ms
    }

    /// Fee for the current net position at `mark`. Positive means longs pay;
    /// negative means shorts receive the same magnitude.
    pub fn funding_fee(&self, net_position: f64, mark: f64) -> f64 {
        net_position * mark * self.funding_rate
    }

    /// Advances the watermark and books `fee` into the totals. A zero fee
    /// (flat book at the boundary) still advances the watermark.
    pub fn settle(&mut self, now: i64, fee: f64) {
        self.last_settlement = now;
        self.settlement_count += 1;
        self.total_fees_abs += fee.abs();
        self.net_flow += fee;
        debug!(
            "[FUNDING] Settled @ {}: fee {:.8} (net flow {:.8})",
            now, fee, self.net_flow
        );
    }

    /// Non-negative cumulative fee drag.
    pub fn total_fees(&self) -> f64 {
        self.total_fees_abs
    }

    /// Signed cumulative cash flow, as applied to capital.
    pub fn net_flow(&self) -> f64 {
        self.net_flow
    }

    pub fn settlement_count(&self) -> u32 {
        self.settlement_count
    }
}
