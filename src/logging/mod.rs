pub mod trade_audit;

pub use trade_audit::export_trades;
