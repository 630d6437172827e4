//! Integration test fixtures for the Matchday order pipeline.
//!
//! Tests run the real [`OrderService`] over the in-memory store adapters, so
//! every scenario exercises the full placement/cancellation sequence without
//! a database.
//!
//! # Test Categories
//!
//! - `order_placement` - Placement pipeline, totals, decrements, compensation
//! - `order_cancellation` - Cancellation gate and stock restoration
//! - `status_transitions` - Lifecycle moves through the service
//! - `event_dispatch` - Bus semantics observed end to end

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal::Decimal;

use matchday_core::{ProductId, Size, UserId};
use matchday_orders::store::{
    InMemoryInventoryStore, InMemoryOrderStore, InventoryStore, StoreError,
};
use matchday_orders::events::{InventoryAlertObserver, LogObserver};
use matchday_orders::{
    Cart, EventBus, EventKind, EventObserver, InventoryRecord, ObserverError, OrderService,
    Product, Role, User,
};

/// A fully wired pipeline over in-memory stores.
pub struct PipelineContext {
    /// The orchestrator under test.
    pub service: OrderService,
    /// Relational-side handle, for direct assertions.
    pub orders: Arc<InMemoryOrderStore>,
    /// Document-side handle, for seeding and direct assertions.
    pub inventory: Arc<InMemoryInventoryStore>,
    /// The bus the service publishes to.
    pub events: Arc<EventBus>,
}

impl PipelineContext {
    /// Wire an `OrderService` over fresh in-memory stores.
    #[must_use]
    pub fn new() -> Self {
        let orders = Arc::new(InMemoryOrderStore::new());
        let inventory = Arc::new(InMemoryInventoryStore::new());

        // Wired the way a process entry point would: log everything, alert
        // on inventory events.
        let events = Arc::new(EventBus::new());
        for kind in [
            EventKind::OrderCreated,
            EventKind::OrderUpdated,
            EventKind::OrderCancelled,
        ] {
            events.attach(kind, Arc::new(LogObserver));
        }
        for kind in [EventKind::LowStock, EventKind::OutOfStock] {
            events.attach(kind, Arc::new(InventoryAlertObserver));
        }

        let service = OrderService::new(orders.clone(), inventory.clone(), events.clone());
        Self {
            service,
            orders,
            inventory,
            events,
        }
    }

    /// Seed a product and its inventory document; returns the catalog
    /// snapshot carts embed.
    ///
    /// # Panics
    ///
    /// Panics if seeding the in-memory inventory store fails.
    pub async fn seed_product(
        &self,
        id: i32,
        name: &str,
        price: Decimal,
        sizes: &[(&str, i32)],
    ) -> Product {
        let size_map: HashMap<Size, i32> = sizes
            .iter()
            .map(|(size, count)| (Size::from(*size), *count))
            .collect();

        self.inventory
            .put(InventoryRecord::with_sizes(
                ProductId::new(id),
                size_map.clone(),
            ))
            .await
            .expect("seed inventory");

        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} (official)"),
            price,
            category: "jerseys".to_string(),
            team: Some("Deportivo Cali".to_string()),
            league: Some("Liga BetPlay".to_string()),
            season: Some("2025/26".to_string()),
            image_url: None,
            active: true,
            created_at: Utc::now(),
            inventory: size_map,
        }
    }

    /// Current live count for a (product, size).
    ///
    /// # Panics
    ///
    /// Panics if the in-memory inventory store fails.
    pub async fn count(&self, product_id: i32, size: &str) -> i32 {
        self.inventory
            .count(ProductId::new(product_id), &Size::from(size))
            .await
            .expect("count inventory")
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A customer profile with default address and phone.
#[must_use]
pub fn test_user(id: i32) -> User {
    User {
        id: UserId::new(id),
        name: "Camila Torres".to_string(),
        email: "camila@example.com".to_string(),
        phone: Some("555-0101".to_string()),
        address: Some("Calle 10 #4-21, Cali".to_string()),
        role: Role::Customer,
        active: true,
        registered_at: Utc::now(),
    }
}

/// A one-product cart requesting `quantity` of `size`.
#[must_use]
pub fn cart_with(user: &User, product: Product, size: &str, quantity: i32) -> Cart {
    let mut cart = Cart::new(user.id);
    assert!(
        cart.add(product, Size::from(size), quantity),
        "snapshot stock must cover the cart fixture"
    );
    cart
}

/// Observer that records every event it receives.
#[derive(Default)]
pub struct CapturingObserver {
    seen: Mutex<Vec<(EventKind, serde_json::Value)>>,
}

impl CapturingObserver {
    /// Create a capturing observer behind an `Arc`, ready to attach.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Everything received so far, in dispatch order.
    ///
    /// # Panics
    ///
    /// Panics if the interior lock is poisoned.
    #[must_use]
    pub fn seen(&self) -> Vec<(EventKind, serde_json::Value)> {
        self.seen.lock().expect("Mutex poisoned").clone()
    }

    /// How many events of `kind` were received.
    #[must_use]
    pub fn count_of(&self, kind: EventKind) -> usize {
        self.seen().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl EventObserver for CapturingObserver {
    fn name(&self) -> &str {
        "capturing"
    }

    fn on_event(&self, kind: EventKind, payload: &serde_json::Value) -> Result<(), ObserverError> {
        self.seen
            .lock()
            .expect("Mutex poisoned")
            .push((kind, payload.clone()));
        Ok(())
    }
}

/// Observer that always fails, for dispatch-isolation tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingObserver;

impl EventObserver for FailingObserver {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_event(&self, _: EventKind, _: &serde_json::Value) -> Result<(), ObserverError> {
        Err(ObserverError::new("transport unavailable"))
    }
}

/// Inventory store double that overstates counts on reads.
///
/// Feasibility checks see `phantom` more units than exist, while writes go
/// straight through - the deterministic stand-in for a concurrent shopper
/// winning the race between validation and commit.
pub struct OverstatedInventoryStore {
    inner: Arc<InMemoryInventoryStore>,
    phantom: i32,
}

impl OverstatedInventoryStore {
    /// Wrap a real store, inflating every read by `phantom` units.
    #[must_use]
    pub const fn new(inner: Arc<InMemoryInventoryStore>, phantom: i32) -> Self {
        Self { inner, phantom }
    }
}

#[async_trait::async_trait]
impl InventoryStore for OverstatedInventoryStore {
    async fn record(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, StoreError> {
        self.inner.record(product_id).await
    }

    async fn count(&self, product_id: ProductId, size: &Size) -> Result<i32, StoreError> {
        Ok(self.inner.count(product_id, size).await? + self.phantom)
    }

    async fn put(&self, record: InventoryRecord) -> Result<(), StoreError> {
        self.inner.put(record).await
    }

    async fn decrement(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        self.inner.decrement(product_id, size, quantity).await
    }

    async fn increment(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<i32, StoreError> {
        self.inner.increment(product_id, size, quantity).await
    }
}
