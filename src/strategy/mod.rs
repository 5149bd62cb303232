pub mod common;
pub mod orders;
pub mod positions;
pub mod types;

use crate::model::OrderSide;

pub use types::{GridMode, GridType};

/// Placement and pairing rules for one grid mode.
///
/// The three modes share a single order/position state machine and differ
/// only here. The engine resolves its policy once at construction from the
/// configured [`GridMode`]; nothing downstream branches on the mode again.
pub trait ModePolicy: Send + Sync {
    /// Side of the order resting at a level when the grid is seeded, or
    /// `None` when the level starts empty.
    fn initial_side(&self, level_price: f64, seed_price: f64) -> Option<OrderSide>;

    /// Level and side of the counter order armed after a fill at `level`.
    ///
    /// Adjacency is the same in every mode: a filled buy re-arms a sell one
    /// level above, a filled sell re-arms a buy one level below. `None` when
    /// the counter would fall off the grid edge.
    fn counter_placement(
        &self,
        side: OrderSide,
        level: usize,
        grid_count: usize,
    ) -> Option<(usize, OrderSide)> {
        match side {
            OrderSide::Buy if level + 1 < grid_count => Some((level + 1, OrderSide::Sell)),
            OrderSide::Sell if level > 0 => Some((level - 1, OrderSide::Buy)),
            _ => None,
        }
    }

    /// Level whose open position a fill at `level` tries to close. `None`
    /// means fills on that side always open at their own level.
    fn pairing_level(&self, side: OrderSide, level: usize, grid_count: usize) -> Option<usize>;
}

/// Long bias: buys open below the seed, sells close one level above their
/// originating buy.
pub struct LongGrid;

/// Short bias: sells open at or above the seed, buys close one level below
/// their originating sell.
pub struct ShortGrid;

/// Neutral bias: both sides open, each fill first tries to close the
/// adjacent level implied by the counter-order rule.
pub struct NeutralGrid;

impl ModePolicy for LongGrid {
    fn initial_side(&self, level_price: f64, seed_price: f64) -> Option<OrderSide> {
        if level_price < seed_price {
            Some(OrderSide::Buy)
        } else if level_price > seed_price {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }

    fn pairing_level(&self, side: OrderSide, level: usize, _grid_count: usize) -> Option<usize> {
        match side {
            OrderSide::Sell if level > 0 => Some(level - 1),
            _ => None,
        }
    }
}

impl ModePolicy for ShortGrid {
    fn initial_side(&self, level_price: f64, seed_price: f64) -> Option<OrderSide> {
        if level_price >= seed_price {
            Some(OrderSide::Sell)
        } else {
            Some(OrderSide::Buy)
        }
    }

    fn pairing_level(&self, side: OrderSide, level: usize, grid_count: usize) -> Option<usize> {
        match side {
            OrderSide::Buy if level + 1 < grid_count => Some(level + 1),
            _ => None,
        }
    }
}

impl ModePolicy for NeutralGrid {
    fn initial_side(&self, level_price: f64, seed_price: f64) -> Option<OrderSide> {
        if level_price < seed_price {
            Some(OrderSide::Buy)
        } else if level_price > seed_price {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }

    fn pairing_level(&self, side: OrderSide, level: usize, grid_count: usize) -> Option<usize> {
        match side {
            OrderSide::Sell if level > 0 => Some(level - 1),
            OrderSide::Buy if level + 1 < grid_count => Some(level + 1),
            _ => None,
        }
    }
}

impl GridMode {
    pub fn policy(self) -> &'static dyn ModePolicy {
        match self {
            GridMode::Long => &LongGrid,
            GridMode::Short => &ShortGrid,
            GridMode::Neutral => &NeutralGrid,
        }
    }
}
