use serde::{Deserialize, Serialize};

/// A single OHLCV candle. Timestamps are epoch milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// A bar whose high is below its low cannot have happened; the engine
    /// skips such bars wholesale.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }

    /// Sign convention for position quantities: buys add, sells subtract.
    pub fn signum(&self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// A resting limit order pinned to one grid level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridOrder {
    pub id: OrderId,
    pub level: usize,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
}

/// An order crossed by the current bar. Fill price is the order's limit
/// price; there is no slippage model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderFill {
    pub order_id: OrderId,
    pub level: usize,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
}

/// One row of the append-only trade audit log.
///
/// `funding_fee` carries the net funding cash flow settled in the same bar,
/// attributed to the first trade of that bar; it is zero on all other rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: i64,
    pub side: OrderSide,
    pub level: usize,
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub realized_pnl: f64,
    pub funding_fee: f64,
    pub net_position: f64,
}
