//! Publish/subscribe event dispatch.
//!
//! The bus decouples side effects (notification, alerting, logging) from the
//! transactional order path: services publish after their writes commit, and
//! observers run on the caller's task, in registration order. An observer
//! failure is caught and logged - it never aborts remaining observers or the
//! publishing operation, and there is no retry or dead-letter queue.
//!
//! Every event is also appended to a bounded in-memory history (a ring
//! buffer: the oldest record is evicted once capacity is reached).

pub mod observers;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use observers::{InventoryAlertObserver, LogObserver};

/// The closed set of event kinds the pipeline emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// An order was placed and committed.
    OrderCreated,
    /// An order's status changed.
    OrderUpdated,
    /// An order was cancelled and its stock restored.
    OrderCancelled,
    /// A size's remaining count dropped to or below the threshold.
    LowStock,
    /// A size's remaining count dropped to zero.
    OutOfStock,
    /// A new user registered.
    UserRegistered,
    /// A payment completed.
    PaymentProcessed,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderCreated => "ORDER_CREATED",
            Self::OrderUpdated => "ORDER_UPDATED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::LowStock => "LOW_STOCK",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::UserRegistered => "USER_REGISTERED",
            Self::PaymentProcessed => "PAYMENT_PROCESSED",
        };
        write!(f, "{s}")
    }
}

/// An immutable dispatched-event record.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Event data, shaped per kind.
    pub payload: serde_json::Value,
    /// When the event was dispatched.
    pub timestamp: DateTime<Utc>,
}

/// A failure inside an observer. Confined to dispatch: logged, never
/// propagated to the publisher.
#[derive(Debug, Error)]
#[error("observer failure: {0}")]
pub struct ObserverError(String);

impl ObserverError {
    /// Create an observer error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Capability interface for event consumers.
pub trait EventObserver: Send + Sync {
    /// Stable name, used in dispatch logs.
    fn name(&self) -> &str;

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError`] on failure; the bus logs it and moves on.
    fn on_event(&self, kind: EventKind, payload: &serde_json::Value) -> Result<(), ObserverError>;
}

/// Default bound on the in-memory event history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Publish/subscribe dispatcher with per-kind registration and bounded
/// history.
///
/// Registration is idempotent per (kind, observer instance): attaching the
/// same `Arc` twice for one kind keeps a single registration.
pub struct EventBus {
    observers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventObserver>>>>,
    history: RwLock<VecDeque<Event>>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a bus with a custom history capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register an observer for an event kind.
    ///
    /// Attaching the same instance again for the same kind is a no-op.
    pub fn attach(&self, kind: EventKind, observer: Arc<dyn EventObserver>) {
        let mut observers = self.observers.write().expect("RwLock poisoned");
        let registered = observers.entry(kind).or_default();
        if registered
            .iter()
            .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&observer)))
        {
            return;
        }
        registered.push(observer);
    }

    /// Remove an observer from an event kind. No-op if it was not attached.
    pub fn detach(&self, kind: EventKind, observer: &Arc<dyn EventObserver>) {
        let mut observers = self.observers.write().expect("RwLock poisoned");
        if let Some(registered) = observers.get_mut(&kind) {
            registered
                .retain(|existing| !std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(observer)));
        }
    }

    /// Number of observers attached to a kind.
    #[must_use]
    pub fn observer_count(&self, kind: EventKind) -> usize {
        let observers = self.observers.read().expect("RwLock poisoned");
        observers.get(&kind).map_or(0, Vec::len)
    }

    /// Record the event in history, then synchronously invoke every observer
    /// attached to `kind`, in registration order.
    ///
    /// Runs on the caller's task and returns once every observer has. An
    /// observer error is logged and skipped; it never reaches the caller.
    pub fn notify(&self, kind: EventKind, payload: serde_json::Value) {
        let event = Event {
            kind,
            payload,
            timestamp: Utc::now(),
        };

        {
            let mut history = self.history.write().expect("RwLock poisoned");
            if history.len() == self.capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // Snapshot so a handler that re-enters attach/detach can't deadlock.
        let attached: Vec<Arc<dyn EventObserver>> = {
            let observers = self.observers.read().expect("RwLock poisoned");
            observers.get(&kind).cloned().unwrap_or_default()
        };

        for observer in attached {
            if let Err(error) = observer.on_event(kind, &event.payload) {
                warn!(
                    observer = observer.name(),
                    kind = %kind,
                    error = %error,
                    "Event observer failed"
                );
            }
        }
    }

    /// The most recent `limit` records, oldest first, optionally filtered by
    /// kind.
    #[must_use]
    pub fn history(&self, kind: Option<EventKind>, limit: usize) -> Vec<Event> {
        let history = self.history.read().expect("RwLock poisoned");
        let matching: Vec<Event> = history
            .iter()
            .filter(|event| kind.is_none_or(|k| event.kind == k))
            .cloned()
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).collect()
    }

    /// Drop all recorded history.
    pub fn clear_history(&self) {
        self.history.write().expect("RwLock poisoned").clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let history = self.history.read().expect("RwLock poisoned");
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("recorded", &history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    struct Counting {
        calls: Mutex<u32>,
    }

    impl Counting {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().expect("Mutex poisoned")
        }
    }

    impl EventObserver for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn on_event(&self, _: EventKind, _: &serde_json::Value) -> Result<(), ObserverError> {
            *self.calls.lock().expect("Mutex poisoned") += 1;
            Ok(())
        }
    }

    struct AlwaysFails;

    impl EventObserver for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        fn on_event(&self, _: EventKind, _: &serde_json::Value) -> Result<(), ObserverError> {
            Err(ObserverError::new("boom"))
        }
    }

    #[test]
    fn test_attach_is_idempotent_per_instance() {
        let bus = EventBus::new();
        let observer = Counting::new();

        bus.attach(EventKind::OrderCreated, observer.clone());
        bus.attach(EventKind::OrderCreated, observer.clone());
        assert_eq!(bus.observer_count(EventKind::OrderCreated), 1);

        bus.notify(EventKind::OrderCreated, json!({}));
        assert_eq!(observer.calls(), 1);

        // A second instance of the same type is a separate registration.
        bus.attach(EventKind::OrderCreated, Counting::new());
        assert_eq!(bus.observer_count(EventKind::OrderCreated), 2);
    }

    #[test]
    fn test_detach_unknown_is_noop() {
        let bus = EventBus::new();
        let attached = Counting::new();
        let never_attached: Arc<dyn EventObserver> = Counting::new();

        bus.attach(EventKind::OrderUpdated, attached.clone());
        bus.detach(EventKind::OrderUpdated, &never_attached);
        assert_eq!(bus.observer_count(EventKind::OrderUpdated), 1);

        let attached_dyn: Arc<dyn EventObserver> = attached;
        bus.detach(EventKind::OrderUpdated, &attached_dyn);
        assert_eq!(bus.observer_count(EventKind::OrderUpdated), 0);
    }

    #[test]
    fn test_failing_observer_does_not_abort_dispatch() {
        let bus = EventBus::new();
        let counting = Counting::new();

        bus.attach(EventKind::OrderCancelled, Arc::new(AlwaysFails));
        bus.attach(EventKind::OrderCancelled, counting.clone());

        bus.notify(EventKind::OrderCancelled, json!({"order_id": 1}));
        assert_eq!(counting.calls(), 1);
    }

    #[test]
    fn test_observers_only_receive_their_kind() {
        let bus = EventBus::new();
        let observer = Counting::new();
        bus.attach(EventKind::LowStock, observer.clone());

        bus.notify(EventKind::OutOfStock, json!({}));
        assert_eq!(observer.calls(), 0);

        bus.notify(EventKind::LowStock, json!({}));
        assert_eq!(observer.calls(), 1);
    }

    #[test]
    fn test_history_is_bounded_ring() {
        let bus = EventBus::with_capacity(3);
        for i in 0..5 {
            bus.notify(EventKind::OrderCreated, json!({"seq": i}));
        }

        let records = bus.history(None, 10);
        assert_eq!(records.len(), 3);
        let seqs: Vec<i64> = records
            .iter()
            .map(|e| e.payload["seq"].as_i64().expect("seq"))
            .collect();
        assert_eq!(seqs, vec![2, 3, 4]);
    }

    #[test]
    fn test_history_filter_and_limit() {
        let bus = EventBus::new();
        bus.notify(EventKind::OrderCreated, json!({"seq": 0}));
        bus.notify(EventKind::LowStock, json!({"seq": 1}));
        bus.notify(EventKind::OrderCreated, json!({"seq": 2}));
        bus.notify(EventKind::OrderCreated, json!({"seq": 3}));

        let created = bus.history(Some(EventKind::OrderCreated), 2);
        let seqs: Vec<i64> = created
            .iter()
            .map(|e| e.payload["seq"].as_i64().expect("seq"))
            .collect();
        assert_eq!(seqs, vec![2, 3]);

        bus.clear_history();
        assert!(bus.history(None, 10).is_empty());
    }
}
