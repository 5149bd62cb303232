use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FUNDING_INTERVAL_HOURS, MS_PER_HOUR};

pub use crate::strategy::types::{GridMode, GridType};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GridStrategyConfig {
    pub symbol: String,
    pub mode: GridMode,
    pub lower_price: f64,
    pub upper_price: f64,
    /// Number of grid levels. Level 0 sits at `lower_price`, level
    /// `grid_count - 1` at `upper_price`.
    pub grid_count: u32,
    pub initial_capital: f64,
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    /// Proportional fee charged on every fill, opens and closes alike.
    #[serde(default)]
    pub fee_rate: f64,
    /// Signed funding rate applied per settlement interval. Positive rates
    /// charge longs and pay shorts.
    #[serde(default)]
    pub funding_rate: f64,
    #[serde(default = "default_funding_interval_hours")]
    pub funding_interval_hours: f64,
    #[serde(default = "default_grid_type")]
    pub grid_type: GridType,
}

fn default_leverage() -> f64 {
    1.0
}

fn default_funding_interval_hours() -> f64 {
    DEFAULT_FUNDING_INTERVAL_HOURS
}

fn default_grid_type() -> GridType {
    GridType::Arithmetic
}

impl GridStrategyConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.symbol.is_empty() {
            return Err(anyhow::anyhow!("Symbol must not be empty."));
        }
        if self.grid_count < 2 {
            return Err(anyhow::anyhow!(
                "Grid count {} must be at least 2.",
                self.grid_count
            ));
        }
        if self.lower_price <= 0.0 {
            return Err(anyhow::anyhow!(
                "Lower price {} must be positive.",
                self.lower_price
            ));
        }
        if self.upper_price <= self.lower_price {
            return Err(anyhow::anyhow!(
                "Upper price {} must be greater than lower price {}.",
                self.upper_price,
                self.lower_price
            ));
        }
        if self.initial_capital <= 0.0 {
            return Err(anyhow::anyhow!("Initial capital must be positive."));
        }
        if !self.leverage.is_finite() || self.leverage < 1.0 {
            return Err(anyhow::anyhow!(
                "Leverage {} must be at least 1.",
                self.leverage
            ));
        }
        if !(0.0..=0.01).contains(&self.fee_rate) {
            return Err(anyhow::anyhow!(
                "Fee rate {} must be between 0 and 0.01.",
                self.fee_rate
            ));
        }
        if !self.funding_rate.is_finite() {
            return Err(anyhow::anyhow!("Funding rate must be a finite number."));
        }
        if self.funding_interval_hours <= 0.0 {
            return Err(anyhow::anyhow!(
                "Funding interval {} hours must be positive.",
                self.funding_interval_hours
            ));
        }
        Ok(())
    }

    /// Funding settlement interval in epoch milliseconds.
    pub fn funding_interval_ms(&self) -> i64 {
        (self.funding_interval_hours * MS_PER_HOUR as f64) as i64
    }

    /// Notional value assigned to each grid level. Order quantity at a level
    /// is this notional divided by the level price, so margin per opened
    /// level comes out to `initial_capital / grid_count`.
    pub fn per_level_notional(&self) -> f64 {
        self.initial_capital * self.leverage / self.grid_count as f64
    }
}
