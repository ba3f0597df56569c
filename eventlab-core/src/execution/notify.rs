//! Trade-alert notifiers.
//!
//! Notifications are fire-and-forget. The execution handler logs and discards
//! any failure; a notifier can never block or fail a fill.

use crate::domain::OrderEvent;
use crate::error::NotificationError;

pub trait Notifier: Send + Sync {
    /// Channel name used in logs (e.g., "log", "email").
    fn channel(&self) -> &str;

    fn notify(&self, order: &OrderEvent) -> Result<(), NotificationError>;
}

/// Emits the trade alert as a structured `info` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn channel(&self) -> &str {
        "log"
    }

    fn notify(&self, order: &OrderEvent) -> Result<(), NotificationError> {
        tracing::info!(
            symbol = %order.symbol,
            date = %order.timestamp,
            side = %order.direction,
            quantity = order.quantity,
            "trade alert"
        );
        Ok(())
    }
}

/// Drops every alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn channel(&self) -> &str {
        "noop"
    }

    fn notify(&self, _order: &OrderEvent) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Send an alert through every notifier, swallowing failures.
///
/// Returns the number of failed channels.
pub fn broadcast(notifiers: &[Box<dyn Notifier>], order: &OrderEvent) -> usize {
    let mut failed = 0;
    for notifier in notifiers {
        if let Err(e) = notifier.notify(order) {
            failed += 1;
            tracing::warn!(
                channel = notifier.channel(),
                symbol = %order.symbol,
                error = %e,
                "notification failed, continuing"
            );
        }
    }
    failed
}
