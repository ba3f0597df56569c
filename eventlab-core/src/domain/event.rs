//! Event model — the closed set of things that travel through the queue.
//!
//! Each variant carries only what its consumer needs. A `MarketEvent` has no
//! prices; the strategy reads them from the data handler.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Market => "MARKET",
            EventKind::Signal => "SIGNAL",
            EventKind::Order => "ORDER",
            EventKind::Fill => "FILL",
        };
        f.write_str(s)
    }
}

/// Strategy intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    Long,
    Short,
    Exit,
}

/// Side of an order or fill. Quantities are always positive; the side carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

/// A new bar is available for `symbol` on `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub symbol: String,
    pub timestamp: NaiveDate,
}

/// Trading intent produced by a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub timestamp: NaiveDate,
    pub direction: SignalDirection,
    /// Sizing multiplier applied by the order generator.
    pub strength: f64,
}

impl SignalEvent {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDate,
        direction: SignalDirection,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            direction,
            strength: 1.0,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

/// Concrete instruction to trade `quantity` shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub symbol: String,
    pub timestamp: NaiveDate,
    pub quantity: u64,
    pub direction: OrderSide,
}

impl OrderEvent {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDate,
        quantity: u64,
        direction: OrderSide,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            quantity,
            direction,
        }
    }

    /// Signed share delta this order would apply to a position.
    pub fn signed_quantity(&self) -> i64 {
        self.direction.sign() * self.quantity as i64
    }
}

/// Realized result of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub symbol: String,
    pub timestamp: NaiveDate,
    pub quantity: u64,
    pub direction: OrderSide,
    /// `quantity * price`, before commission.
    pub fill_cost: f64,
    pub commission: f64,
    pub venue: String,
}

impl FillEvent {
    /// Average execution price per share.
    pub fn price(&self) -> f64 {
        if self.quantity == 0 {
            return 0.0;
        }
        self.fill_cost / self.quantity as f64
    }

    /// Cash delta: buys pay cost plus commission, sells receive cost minus commission.
    pub fn cash_delta(&self) -> f64 {
        match self.direction {
            OrderSide::Buy => -(self.fill_cost + self.commission),
            OrderSide::Sell => self.fill_cost - self.commission,
        }
    }

    pub fn signed_quantity(&self) -> i64 {
        self.direction.sign() * self.quantity as i64
    }
}

/// Everything that travels through the engine queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Market(_) => EventKind::Market,
            Event::Signal(_) => EventKind::Signal,
            Event::Order(_) => EventKind::Order,
            Event::Fill(_) => EventKind::Fill,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Event::Market(e) => &e.symbol,
            Event::Signal(e) => &e.symbol,
            Event::Order(e) => &e.symbol,
            Event::Fill(e) => &e.symbol,
        }
    }

    pub fn timestamp(&self) -> NaiveDate {
        match self {
            Event::Market(e) => e.timestamp,
            Event::Signal(e) => e.timestamp,
            Event::Order(e) => e.timestamp,
            Event::Fill(e) => e.timestamp,
        }
    }
}

impl From<MarketEvent> for Event {
    fn from(e: MarketEvent) -> Self {
        Event::Market(e)
    }
}

impl From<SignalEvent> for Event {
    fn from(e: SignalEvent) -> Self {
        Event::Signal(e)
    }
}

impl From<OrderEvent> for Event {
    fn from(e: OrderEvent) -> Self {
        Event::Order(e)
    }
}

impl From<FillEvent> for Event {
    fn from(e: FillEvent) -> Self {
        Event::Fill(e)
    }
}
