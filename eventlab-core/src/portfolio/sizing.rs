//! Order sizing for signal → order conversion.

use serde::{Deserialize, Serialize};

use crate::domain::SignalEvent;

/// Default order size in shares.
pub const DEFAULT_ORDER_QUANTITY: u64 = 100;

/// Fixed share count per signal, scaled by signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderSizer {
    pub base_quantity: u64,
}

impl OrderSizer {
    pub fn fixed(base_quantity: u64) -> Self {
        Self { base_quantity }
    }

    /// Shares to trade for `signal`. Negative or NaN strengths size to zero.
    pub fn quantity_for(&self, signal: &SignalEvent) -> u64 {
        let scaled = self.base_quantity as f64 * signal.strength;
        if scaled.is_nan() || scaled <= 0.0 {
            return 0;
        }
        scaled.round() as u64
    }
}

impl Default for OrderSizer {
    fn default() -> Self {
        Self::fixed(DEFAULT_ORDER_QUANTITY)
    }
}
