use std::collections::BTreeMap;

use log::debug;

use crate::constants::QTY_EPSILON;
use crate::model::OrderSide;
use crate::strategy::ModePolicy;

/// Inventory held at one grid level. Quantity is signed: positive long,
/// negative short.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub level: usize,
    pub quantity: f64,
    pub entry_price: f64,
    pub opened_at: i64,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }
}

/// The slice of a position consumed by a closing fill. Quantity is the
/// positive magnitude closed; `was_long` carries the closed direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedLot {
    pub quantity: f64,
    pub entry_price: f64,
    pub was_long: bool,
}

/// Per-level inventory map. At most one entry per level; an entry whose
/// quantity reaches zero is removed immediately.
#[derive(Default)]
pub struct PositionManager {
    positions: BTreeMap<usize, Position>,
}

fn closes(side: OrderSide, position: &Position) -> bool {
    match side {
        OrderSide::Sell => position.quantity > 0.0,
        OrderSide::Buy => position.quantity < 0.0,
    }
}

impl PositionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, level: usize) -> Option<&Position> {
        self.positions.get(&level)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Level whose position a fill at `level` closes, per the mode's pairing
    /// rule. The candidate must exist AND be closable by the fill side (a
    /// sell closes a long, a buy closes a short); otherwise the fill opens
    /// at its own level.
    pub fn find_matching_position(
        &self,
        level: usize,
        side: OrderSide,
        policy: &dyn ModePolicy,
        grid_count: usize,
    ) -> Option<usize> {
        let target = policy.pairing_level(side, level, grid_count)?;
        let position = self.positions.get(&target)?;
        if closes(side, position) {
            Some(target)
        } else {
            None
        }
    }

    /// True when `level` holds inventory the given side would close. Used
    /// for same-level netting when pairing found nothing.
    pub fn closable_at(&self, level: usize, side: OrderSide) -> bool {
        self.positions.get(&level).is_some_and(|p| closes(side, p))
    }

    /// Consumes up to `quantity` from the position at `level`, removing the
    /// entry once its quantity reaches zero. Returns the closed slice, or
    /// `None` when the level holds nothing.
    pub fn reduce(&mut self, level: usize, quantity: f64) -> Option<ClosedLot> {
        let position = self.positions.get_mut(&level)?;
        let was_long = position.is_long();
        let available = position.quantity.abs();
        let closed = quantity.min(available);

        position.quantity -= if was_long { closed } else { -closed };
        let entry_price = position.entry_price;
        if position.quantity.abs() < QTY_EPSILON {
            self.positions.remove(&level);
            debug!("[POSITION] Level {} flat, entry removed", level);
        }

        Some(ClosedLot {
            quantity: closed,
            entry_price,
            was_long,
        })
    }

    /// Books a fill as new inventory at `level`. Same-direction inventory
    /// merges with a volume-weighted entry price. Opposite directions must
    /// be netted through [`reduce`](Self::reduce) before calling this.
    pub fn open(&mut self, level: usize, side: OrderSide, quantity: f64, price: f64, timestamp: i64) {
        let signed = side.signum() * quantity;
        match self.positions.get_mut(&level) {
            Some(position) => {
                debug_assert!(
                    position.quantity.signum() == signed.signum(),
                    "opposite-direction open at level {} must net via reduce first",
                    level
                );
                let old_abs = position.quantity.abs();
                let merged_abs = old_abs + quantity;
                position.entry_price =
                    (old_abs * position.entry_price + quantity * price) / merged_abs;
                position.quantity += signed;
                debug!(
                    "[POSITION] Level {} merged to {:.8} @ {:.4}",
                    level, position.quantity, position.entry_price
                );
            }
            None => {
                self.positions.insert(
                    level,
                    Position {
                        level,
                        quantity: signed,
                        entry_price: price,
                        opened_at: timestamp,
                    },
                );
                debug!(
                    "[POSITION] Level {} opened {:.8} @ {:.4}",
                    level, signed, price
                );
            }
        }
    }

    /// Signed sum of all per-level quantities.
    pub fn net_position(&self) -> f64 {
        self.positions.values().map(|p| p.quantity).sum()
    }

    /// Mark-to-market PnL of all open entries against `mark`. The signed
    /// quantity makes `q * (mark - entry)` correct for both directions.
    pub fn unrealized_pnl(&self, mark: f64) -> f64 {
        self.positions
            .values()
            .map(|p| p.quantity * (mark - p.entry_price))
            .sum()
    }
}
