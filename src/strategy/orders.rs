use std::collections::HashMap;

use log::{debug, info, warn};

use crate::error::EngineError;
use crate::model::{Bar, GridOrder, OrderFill, OrderId, OrderSide};
use crate::strategy::ModePolicy;

/// Open-order book for one grid run.
///
/// The `orders` arena is the authoritative store; `slots` keeps one FIFO
/// queue of order ids per grid level. Orders at the same level coexist and
/// are never overwritten: a counter order landing on an occupied level joins
/// the back of that level's queue.
pub struct OrderManager {
    prices: Vec<f64>,
    orders: HashMap<OrderId, GridOrder>,
    slots: Vec<Vec<OrderId>>,
    next_id: u64,
}

impl OrderManager {
    pub fn new(prices: Vec<f64>) -> Self {
        let slots = vec![Vec::new(); prices.len()];
        Self {
            prices,
            orders: HashMap::new(),
            slots,
            next_id: 0,
        }
    }

    pub fn grid_count(&self) -> usize {
        self.prices.len()
    }

    pub fn open_order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn orders_at(&self, level: usize) -> Vec<&GridOrder> {
        match self.slots.get(level) {
            Some(ids) => ids.iter().filter_map(|id| self.orders.get(id)).collect(),
            None => Vec::new(),
        }
    }

    /// Rests a new limit order at `level`. Rejects non-positive prices and
    /// quantities and out-of-grid levels without touching the book.
    pub fn place_order(
        &mut self,
        level: usize,
        side: OrderSide,
        price: f64,
        quantity: f64,
    ) -> Result<OrderId, EngineError> {
        if level >= self.slots.len() {
            return Err(EngineError::InvalidOrder(format!(
                "level {} outside grid of {} levels",
                level,
                self.slots.len()
            )));
        }
        if !(price > 0.0) {
            return Err(EngineError::InvalidOrder(format!(
                "non-positive price {}",
                price
            )));
        }
        if !(quantity > 0.0) {
            return Err(EngineError::InvalidOrder(format!(
                "non-positive quantity {}",
                quantity
            )));
        }

        let id = OrderId(self.next_id);
        self.next_id += 1;
        self.orders.insert(
            id,
            GridOrder {
                id,
                level,
                side,
                price,
                quantity,
            },
        );
        self.slots[level].push(id);
        Ok(id)
    }

    /// Seeds the grid around `seed_price` per the mode policy. Each order's
    /// quantity is `per_level_notional / level_price`. Returns the number of
    /// orders placed.
    pub fn place_initial_orders(
        &mut self,
        seed_price: f64,
        per_level_notional: f64,
        policy: &dyn ModePolicy,
    ) -> usize {
        let mut placed = 0;
        for level in 0..self.prices.len() {
            let price = self.prices[level];
            if let Some(side) = policy.initial_side(price, seed_price) {
                let quantity = per_level_notional / price;
                match self.place_order(level, side, price, quantity) {
                    Ok(_) => {
                        debug!(
                            "[GRID] Initial {} {:.8} @ {} (level {})",
                            side, quantity, price, level
                        );
                        placed += 1;
                    }
                    Err(e) => warn!("[GRID] Initial order at level {} discarded: {}", level, e),
                }
            }
        }
        info!(
            "[GRID] Grid seeded @ {}: {} initial orders across {} levels",
            seed_price, placed, self.prices.len()
        );
        placed
    }

    /// Sweeps EVERY resting order against the bar: a buy fills iff
    /// `bar.low <= limit`, a sell iff `bar.high >= limit`. All qualifying
    /// orders fill in this bar, each at its own limit price. Filled orders
    /// leave the book; fills come back level-ascending, FIFO within a level.
    pub fn check_order_fills(&mut self, bar: &Bar) -> Vec<OrderFill> {
        let mut fills = Vec::new();
        for level in 0..self.slots.len() {
            if self.slots[level].is_empty() {
                continue;
            }
            let mut remaining = Vec::with_capacity(self.slots[level].len());
            for id in std::mem::take(&mut self.slots[level]) {
                let crossed = match self.orders.get(&id) {
                    Some(order) => match order.side {
                        OrderSide::Buy => bar.low <= order.price,
                        OrderSide::Sell => bar.high >= order.price,
                    },
                    // Stale index id with no arena entry; drop it from the
                    // queue instead of carrying it forward.
                    None => continue,
                };
                if !crossed {
                    remaining.push(id);
                    continue;
                }
                if let Some(order) = self.orders.remove(&id) {
                    debug!(
                        "[FILL] {} {:.8} @ {} (level {})",
                        order.side, order.quantity, order.price, order.level
                    );
                    fills.push(OrderFill {
                        order_id: order.id,
                        level: order.level,
                        side: order.side,
                        price: order.price,
                        quantity: order.quantity,
                    });
                }
            }
            self.slots[level] = remaining;
        }
        fills
    }

    /// Re-arms the grid after a fill: the policy's adjacent level and side,
    /// with the filled quantity. An edge fill has no counter and is skipped.
    pub fn place_counter_order(
        &mut self,
        fill: &OrderFill,
        policy: &dyn ModePolicy,
    ) -> Option<OrderId> {
        match policy.counter_placement(fill.side, fill.level, self.prices.len()) {
            Some((level, side)) => {
                let price = self.prices[level];
                match self.place_order(level, side, price, fill.quantity) {
                    Ok(id) => {
                        debug!(
                            "[GRID] Counter {} {:.8} @ {} (level {} -> {})",
                            side, fill.quantity, price, fill.level, level
                        );
                        Some(id)
                    }
                    Err(e) => {
                        warn!("[GRID] Counter order discarded: {}", e);
                        None
                    }
                }
            }
            None => {
                debug!(
                    "[GRID] No counter for {} fill at edge level {}",
                    fill.side, fill.level
                );
                None
            }
        }
    }
}
