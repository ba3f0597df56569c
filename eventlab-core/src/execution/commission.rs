//! Broker cost functions keyed by venue.
//!
//! A commission model sees only `(symbol, quantity, direction)`. The schedule
//! maps venue identifiers to models; an unknown venue trades for free.

use std::collections::HashMap;

use crate::domain::OrderSide;

/// Commission charged for one fill.
pub trait CommissionModel: Send + Sync {
    fn name(&self) -> &str;

    fn commission(&self, symbol: &str, quantity: u64, direction: OrderSide) -> f64;
}

/// No commission. The naive simulated fill mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroCommission;

impl CommissionModel for ZeroCommission {
    fn name(&self) -> &str {
        "zero"
    }

    fn commission(&self, _symbol: &str, _quantity: u64, _direction: OrderSide) -> f64 {
        0.0
    }
}

/// `rate` per share with a per-order floor.
#[derive(Debug, Clone, Copy)]
pub struct PerShareCommission {
    pub rate: f64,
    pub minimum: f64,
}

impl PerShareCommission {
    pub fn new(rate: f64, minimum: f64) -> Self {
        Self { rate, minimum }
    }
}

impl CommissionModel for PerShareCommission {
    fn name(&self) -> &str {
        "per_share"
    }

    fn commission(&self, _symbol: &str, quantity: u64, _direction: OrderSide) -> f64 {
        if quantity == 0 {
            return 0.0;
        }
        (self.rate * quantity as f64).max(self.minimum)
    }
}

/// Flat fee per order regardless of size.
#[derive(Debug, Clone, Copy)]
pub struct FixedCommission {
    pub amount: f64,
}

impl CommissionModel for FixedCommission {
    fn name(&self) -> &str {
        "fixed"
    }

    fn commission(&self, _symbol: &str, quantity: u64, _direction: OrderSide) -> f64 {
        if quantity == 0 {
            0.0
        } else {
            self.amount
        }
    }
}

/// Venue → commission model registry.
#[derive(Default)]
pub struct CommissionSchedule {
    models: HashMap<String, Box<dyn CommissionModel>>,
}

impl CommissionSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, venue: impl Into<String>, model: Box<dyn CommissionModel>) {
        self.models.insert(venue.into(), model);
    }

    pub fn with(mut self, venue: impl Into<String>, model: Box<dyn CommissionModel>) -> Self {
        self.register(venue, model);
        self
    }

    pub fn model_name(&self, venue: &str) -> &str {
        self.models.get(venue).map_or("zero", |m| m.name())
    }

    pub fn commission(
        &self,
        venue: &str,
        symbol: &str,
        quantity: u64,
        direction: OrderSide,
    ) -> f64 {
        match self.models.get(venue) {
            Some(model) => model.commission(symbol, quantity, direction),
            None => {
                tracing::debug!(venue, "no commission model registered, charging zero");
                0.0
            }
        }
    }
}

impl std::fmt::Debug for CommissionSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut venues: Vec<(&String, &str)> =
            self.models.iter().map(|(v, m)| (v, m.name())).collect();
        venues.sort();
        f.debug_struct("CommissionSchedule")
            .field("venues", &venues)
            .finish()
    }
}
