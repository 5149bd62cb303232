use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::path::Path;

use crate::model::TradeRecord;

/// One exported CSV row. Carries both the raw epoch timestamp and a
/// human-readable UTC rendering of it.
#[derive(Debug, Serialize, Clone)]
pub struct TradeAuditRow {
    pub timestamp: i64,
    pub time: String,
    pub symbol: String,
    pub side: String,
    pub level: usize,
    pub price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub realized_pnl: f64,
    pub funding_fee: f64,
    pub net_position: f64,
}

impl TradeAuditRow {
    fn from_record(symbol: &str, record: &TradeRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            time: format_utc(record.timestamp),
            symbol: symbol.to_string(),
            side: record.side.to_string(),
            level: record.level,
            price: record.price,
            quantity: record.quantity,
            fee: record.fee,
            realized_pnl: record.realized_pnl,
            funding_fee: record.funding_fee,
            net_position: record.net_position,
        }
    }
}

/// Writes the complete trade list of a finished run to `path`.
///
/// With no trades the file is created empty.
pub fn export_trades(path: &Path, symbol: &str, trades: &[TradeRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trade log {}", path.display()))?;

    for record in trades {
        writer
            .serialize(TradeAuditRow::from_record(symbol, record))
            .context("Failed to write trade log row")?;
    }
    writer.flush().context("Failed to flush trade log")?;
    Ok(())
}

fn format_utc(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderSide;
    use tempfile::tempdir;

    fn record(timestamp: i64, side: OrderSide, realized_pnl: f64) -> TradeRecord {
        TradeRecord {
            timestamp,
            side,
            level: 1,
            price: 125.0,
            quantity: 1.6,
            fee: 0.2,
            realized_pnl,
            funding_fee: 0.0,
            net_position: 1.6,
        }
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let trades = vec![
            record(1_700_000_000_000, OrderSide::Buy, 0.0),
            record(1_700_000_060_000, OrderSide::Sell, 40.0),
        ];

        export_trades(&path, "BTC", &trades).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.trim().split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(
            "timestamp,time,symbol,side,level,price,quantity,fee,realized_pnl,funding_fee,net_position"
        ));
        assert!(lines[1].contains("BTC,buy,1,125.0,1.6"));
        assert!(lines[2].contains("sell"));
        assert!(lines[2].contains("40.0"));
        // rfc3339 rendering of the epoch timestamp.
        assert!(lines[1].contains("2023-11-14T"));
    }

    #[test]
    fn test_export_empty_trade_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        export_trades(&path, "BTC", &[]).unwrap();
        assert!(path.exists());
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }
}
