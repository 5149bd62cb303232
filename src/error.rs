use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Recoverable simulation faults. The engine logs these and keeps running;
/// none of them abort a backtest.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient margin: required {required:.4}, available {available:.4}")]
    InsufficientMargin { required: f64, available: f64 },
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Corrupt bar at {timestamp}: high {high} < low {low}")]
    CorruptBar { timestamp: i64, high: f64, low: f64 },
}
