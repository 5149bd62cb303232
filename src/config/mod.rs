use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

pub mod strategy;
pub mod sweep;

pub use self::strategy::GridStrategyConfig;
pub use self::sweep::{OptimizeMetric, SweepConfig};

/// Top-level TOML document: a `[strategy]` table plus an optional
/// `[sweep]` table with parameter ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub strategy: GridStrategyConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepConfig>,
}

pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RunConfig = toml::from_str(&content)?;
    config
        .strategy
        .validate()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    if let Some(sweep) = &config.sweep {
        sweep
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
    }
    Ok(config)
}

/// A complete, valid configuration document for `--print-sample-config`.
pub fn sample_config() -> String {
    let config = RunConfig {
        strategy: GridStrategyConfig {
            symbol: "BTC".to_string(),
            mode: crate::strategy::GridMode::Long,
            lower_price: 50_000.0,
            upper_price: 70_000.0,
            grid_count: 20,
            initial_capital: 10_000.0,
            leverage: 3.0,
            fee_rate: 0.00045,
            funding_rate: 0.0001,
            funding_interval_hours: 8.0,
            grid_type: crate::strategy::GridType::Arithmetic,
        },
        sweep: Some(SweepConfig {
            grid_counts: vec![10, 20, 40],
            lower_prices: vec![],
            upper_prices: vec![],
            leverages: vec![1.0, 2.0, 3.0],
            optimize: OptimizeMetric::SharpeRatio,
        }),
    };
    // A hand-built struct with valid literals always serializes.
    toml::to_string_pretty(&config).unwrap_or_default()
}
