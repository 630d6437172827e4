//! Built-in observers.
//!
//! Transports like email or websockets plug in from outside; these two only
//! need the tracing pipeline, so they live here.

use tracing::{error, info, warn};

use super::{EventKind, EventObserver, ObserverError};

/// Writes every received event to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl EventObserver for LogObserver {
    fn name(&self) -> &str {
        "log"
    }

    fn on_event(&self, kind: EventKind, payload: &serde_json::Value) -> Result<(), ObserverError> {
        info!(kind = %kind, payload = %payload, "Event dispatched");
        Ok(())
    }
}

/// Raises log alerts for inventory events.
///
/// `LowStock` logs a warning with the remaining count; `OutOfStock` logs an
/// error. Other kinds are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryAlertObserver;

impl EventObserver for InventoryAlertObserver {
    fn name(&self) -> &str {
        "inventory-alert"
    }

    fn on_event(&self, kind: EventKind, payload: &serde_json::Value) -> Result<(), ObserverError> {
        let product_id = payload.get("product_id").and_then(serde_json::Value::as_i64);
        let size = payload.get("size").and_then(serde_json::Value::as_str);
        let remaining = payload.get("remaining").and_then(serde_json::Value::as_i64);

        match kind {
            EventKind::LowStock => {
                warn!(product_id, size, remaining, "Stock running low");
            }
            EventKind::OutOfStock => {
                error!(product_id, size, "Product size sold out");
            }
            _ => {}
        }
        Ok(())
    }
}
