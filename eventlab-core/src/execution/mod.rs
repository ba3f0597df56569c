//! Execution — turns order events into fill events.
//!
//! The simulated handler fills every order in full at the bar's adjusted close,
//! with no latency and no slippage. Commission comes from a per-venue schedule
//! (zero by default) and trade alerts go out before the fill is computed.

pub mod commission;
pub mod notify;

pub use commission::{
    CommissionModel, CommissionSchedule, FixedCommission, PerShareCommission, ZeroCommission,
};
pub use notify::{broadcast, LogNotifier, NoopNotifier, Notifier};

use crate::data::DataHandler;
use crate::domain::{BarField, Event, FillEvent, OrderEvent};
use crate::error::EngineError;

/// Default venue identifier for simulated fills.
pub const SIMULATED_VENUE: &str = "SIM";

/// Trait for execution handlers.
///
/// Simulated and live brokerages share this interface so strategies can be
/// backtested the same way they would trade.
pub trait ExecutionHandler: Send {
    /// Venue stamped on every fill this handler produces.
    fn venue(&self) -> &str;

    /// Execute an order event.
    ///
    /// Non-order events are a no-op and yield `Ok(None)`.
    fn execute_order(
        &self,
        data: &dyn DataHandler,
        event: &Event,
    ) -> Result<Option<FillEvent>, EngineError>;

    /// Commission this handler expects to charge for `order`. Used to hold
    /// back cash before the fill exists.
    fn estimate_commission(&self, _order: &OrderEvent) -> f64 {
        0.0
    }
}

/// Fills orders at the adjusted close of the order's bar.
pub struct SimulatedExecutionHandler {
    venue: String,
    commissions: CommissionSchedule,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl SimulatedExecutionHandler {
    /// Zero commission, no notifications.
    pub fn naive() -> Self {
        Self::new(SIMULATED_VENUE)
    }

    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            commissions: CommissionSchedule::new(),
            notifiers: Vec::new(),
        }
    }

    /// Charge `model` for fills on this handler's venue.
    pub fn with_commission(mut self, model: Box<dyn CommissionModel>) -> Self {
        self.commissions.register(self.venue.clone(), model);
        self
    }

    /// Replace the whole venue schedule.
    pub fn with_schedule(mut self, schedule: CommissionSchedule) -> Self {
        self.commissions = schedule;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn commission_model_name(&self) -> &str {
        self.commissions.model_name(&self.venue)
    }

    fn fill(&self, data: &dyn DataHandler, order: &OrderEvent) -> Result<FillEvent, EngineError> {
        broadcast(&self.notifiers, order);

        let price = data.get_bar_value(&order.symbol, order.timestamp, BarField::AdjClose)?;
        let fill_cost = order.quantity as f64 * price;
        let commission = self.estimate_commission(order);

        Ok(FillEvent {
            symbol: order.symbol.clone(),
            timestamp: order.timestamp,
            quantity: order.quantity,
            direction: order.direction,
            fill_cost,
            commission,
            venue: self.venue.clone(),
        })
    }
}

impl ExecutionHandler for SimulatedExecutionHandler {
    fn venue(&self) -> &str {
        &self.venue
    }

    fn execute_order(
        &self,
        data: &dyn DataHandler,
        event: &Event,
    ) -> Result<Option<FillEvent>, EngineError> {
        match event {
            Event::Order(order) => self.fill(data, order).map(Some),
            _ => Ok(None),
        }
    }

    fn estimate_commission(&self, order: &OrderEvent) -> f64 {
        self.commissions
            .commission(&self.venue, &order.symbol, order.quantity, order.direction)
    }
}

impl std::fmt::Debug for SimulatedExecutionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedExecutionHandler")
            .field("venue", &self.venue)
            .field("commissions", &self.commissions)
            .field("notifiers", &self.notifiers.len())
            .finish()
    }
}
