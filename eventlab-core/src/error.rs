//! Error taxonomy for the engine.
//!
//! Only two classes of error may end a run: configuration failures while
//! seeding the queue (`Configuration`) and finalization without any fills
//! (`EmptyCurve`). Everything raised inside a handler during dispatch is
//! logged and the offending event is dropped.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::BarField;

/// Errors produced by the engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("price unavailable: {symbol} {field} on {date}")]
    PriceUnavailable {
        symbol: String,
        date: NaiveDate,
        field: BarField,
    },

    #[error("equity curve is empty: no fills were processed")]
    EmptyCurve,

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("data error: {0}")]
    Data(String),
}

impl EngineError {
    /// Whether the dispatcher may drop the triggering event and keep running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::PriceUnavailable { .. }
                | EngineError::Notification(_)
                | EngineError::Data(_)
        )
    }
}

/// Failure while dispatching a trade alert. Never propagated past the
/// execution handler.
#[derive(Debug, Error)]
#[error("notification via '{channel}' failed: {reason}")]
pub struct NotificationError {
    pub channel: String,
    pub reason: String,
}

impl NotificationError {
    pub fn new(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}
