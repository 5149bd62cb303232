use tracing::warn;

use crate::constants::MARGIN_EPSILON;
use crate::error::EngineError;

/// Used-margin ledger for one run.
///
/// The capital ceiling moves with realized PnL, fees, and funding, so the
/// caller passes current capital into every check instead of the ledger
/// caching a stale total. Margin is allocated at the fill price on open and
/// released at the entry price of the closed slice, which makes a full round
/// trip restore `used_margin` exactly.
pub struct MarginCalculator {
    leverage: f64,
    used_margin: f64,
}

impl MarginCalculator {
    pub fn new(leverage: f64) -> Self {
        Self {
            leverage,
            used_margin: 0.0,
        }
    }

    pub fn used_margin(&self) -> f64 {
        self.used_margin
    }

    pub fn required_margin(&self, quantity: f64, price: f64) -> f64 {
        quantity * price / self.leverage
    }

    pub fn available(&self, capital: f64) -> f64 {
        capital - self.used_margin
    }

    /// Reserves `amount` against `capital`. On insufficient headroom the
    /// ledger is left untouched and the caller gets a recoverable error.
    pub fn allocate(&mut self, amount: f64, capital: f64) -> Result<(), EngineError> {
        if self.used_margin + amount > capital + MARGIN_EPSILON {
            return Err(EngineError::InsufficientMargin {
                required: amount,
                available: self.available(capital),
            });
        }
        self.used_margin += amount;
        Ok(())
    }

    /// Frees `amount`. Going below zero indicates an accounting breach
    /// upstream: it is logged and clamped, never propagated.
    pub fn release(&mut self, amount: f64) {
        self.used_margin -= amount;
        if self.used_margin < 0.0 {
            if self.used_margin < -MARGIN_EPSILON {
                warn!(
                    "[MARGIN] Release overshot used margin by {:.12}, clamping to zero",
                    -self.used_margin
                );
            }
            self.used_margin = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_margin_scales_with_leverage() {
        let margin = MarginCalculator::new(1.0);
        assert!((margin.required_margin(2.0, 100.0) - 200.0).abs() < 1e-9);

        let levered = MarginCalculator::new(5.0);
        assert!((levered.required_margin(2.0, 100.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_allocate_within_ceiling() {
        let mut margin = MarginCalculator::new(1.0);
        assert!(margin.allocate(400.0, 1000.0).is_ok());
        assert!(margin.allocate(600.0, 1000.0).is_ok());
        assert!((margin.used_margin() - 1000.0).abs() < 1e-9);
        assert!(margin.available(1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_allocate_rejection_leaves_ledger_unchanged() {
        let mut margin = MarginCalculator::new(1.0);
        margin.allocate(900.0, 1000.0).unwrap();

        let err = margin.allocate(200.0, 1000.0).unwrap_err();
        assert!(err.to_string().contains("Insufficient margin"));
        assert!((margin.used_margin() - 900.0).abs() < 1e-9);
        assert!((margin.available(1000.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_release_round_trip() {
        let mut margin = MarginCalculator::new(2.0);
        let amount = margin.required_margin(1.6, 125.0);
        margin.allocate(amount, 1000.0).unwrap();
        margin.release(amount);
        assert!(margin.used_margin().abs() < 1e-12);
    }

    #[test]
    fn test_release_clamps_below_zero() {
        let mut margin = MarginCalculator::new(1.0);
        margin.allocate(100.0, 1000.0).unwrap();
        margin.release(150.0);
        assert_eq!(margin.used_margin(), 0.0);
    }
}
