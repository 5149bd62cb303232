//! Central configuration constants for gridlab.
//!
//! This module contains all tunable parameters and magic numbers used throughout
//! the backtester. Modify values here to adjust behavior without changing
//! business logic.

// =============================================================================
// NUMERIC TOLERANCES
// =============================================================================

/// Quantities below this are treated as zero (position entries are removed,
/// residual order quantities are discarded).
pub const QTY_EPSILON: f64 = 1e-9;

/// Slack applied to margin-ceiling comparisons so that a full round trip of
/// allocations and releases never trips on floating-point residue.
pub const MARGIN_EPSILON: f64 = 1e-9;

// =============================================================================
// TIME & ANNUALIZATION
// =============================================================================

/// Milliseconds in one hour, for funding-interval arithmetic.
pub const MS_PER_HOUR: i64 = 3_600_000;

/// Milliseconds in one day, for elapsed-time annualization.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Calendar days used to annualize the total return.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Trading days used to annualize the Sharpe ratio.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Default funding settlement interval (most perp venues settle every 8h).
pub const DEFAULT_FUNDING_INTERVAL_HOURS: f64 = 8.0;

// =============================================================================
// REPORT RENDERING
// =============================================================================

/// Grid tables wider than this are truncated to head and tail rows.
pub const MAX_GRID_ROWS_RENDERED: usize = 40;

/// Number of sweep results shown in the console leaderboard.
pub const SWEEP_LEADERBOARD_ROWS: usize = 10;
