//! Domain types for EventLab

pub mod bar;
pub mod event;
pub mod ids;

pub use bar::{Bar, BarField};
pub use event::{
    Event, EventKind, FillEvent, MarketEvent, OrderEvent, OrderSide, SignalDirection, SignalEvent,
};
pub use ids::{EventId, IdGen};

/// Symbol type alias
pub type Symbol = String;
