//! Thread-safe in-memory store adapters for testing and embedding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use matchday_core::{OrderId, OrderLineId, OrderStatus, ProductId, Size, UserId};

use crate::models::{InventoryRecord, NewOrder, Order, OrderLine};

use super::{InventoryStore, OrderStore, StoreError};

#[derive(Default)]
struct OrdersInner {
    next_order_id: i32,
    next_line_id: i32,
    orders: HashMap<OrderId, Order>,
}

/// In-memory order store.
///
/// IDs are handed out from a per-store sequence, mirroring the relational
/// adapter's serial columns.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<OrdersInner>>,
}

impl InMemoryOrderStore {
    /// Create a new empty in-memory order store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_most_recent_first(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        orders
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");

        inner.next_order_id += 1;
        let order_id = OrderId::new(inner.next_order_id);

        let mut lines = Vec::with_capacity(order.lines().len());
        for line in order.lines() {
            inner.next_line_id += 1;
            lines.push(OrderLine {
                id: OrderLineId::new(inner.next_line_id),
                order_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                size: line.size.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        inner.orders.insert(
            order_id,
            Order {
                id: order_id,
                user_id: order.user_id,
                created_at: Utc::now(),
                status: order.status,
                total: order.total,
                shipping_address: order.shipping_address.clone(),
                phone: order.phone.clone(),
                notes: order.notes.clone(),
                lines,
            },
        );

        Ok(order_id)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner.orders.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let orders = inner
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::sorted_most_recent_first(orders))
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().expect("RwLock poisoned");
        let orders = inner
            .orders
            .values()
            .filter(|order| status.is_none_or(|s| order.status == s))
            .cloned()
            .collect();
        Ok(Self::sorted_most_recent_first(orders))
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let order = inner.orders.get_mut(&id).ok_or(StoreError::NotFound)?;
        order.status = status;
        Ok(())
    }
}

/// In-memory inventory store.
///
/// The decrement condition is checked and applied under one write lock, so
/// it is as atomic as the document-store adapter's conditional write.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    inner: Arc<RwLock<HashMap<ProductId, HashMap<Size, i32>>>>,
}

impl InMemoryInventoryStore {
    /// Create a new empty in-memory inventory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn record(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, StoreError> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner
            .get(&product_id)
            .map(|sizes| InventoryRecord::with_sizes(product_id, sizes.clone())))
    }

    async fn count(&self, product_id: ProductId, size: &Size) -> Result<i32, StoreError> {
        let inner = self.inner.read().expect("RwLock poisoned");
        Ok(inner
            .get(&product_id)
            .and_then(|sizes| sizes.get(size).copied())
            .unwrap_or(0))
    }

    async fn put(&self, record: InventoryRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        inner.insert(record.product_id, record.sizes);
        Ok(())
    }

    async fn decrement(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let Some(sizes) = inner.get_mut(&product_id) else {
            return Ok(None);
        };

        let current = sizes.get(size).copied().unwrap_or(0);
        if current < quantity {
            return Ok(None);
        }

        let remaining = current - quantity;
        sizes.insert(size.clone(), remaining);
        Ok(Some(remaining))
    }

    async fn increment(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<i32, StoreError> {
        let mut inner = self.inner.write().expect("RwLock poisoned");
        let sizes = inner.entry(product_id).or_default();
        let updated = sizes.get(size).copied().unwrap_or(0) + quantity;
        sizes.insert(size.clone(), updated);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::models::{LineInput, NewOrder};

    use super::*;

    fn record(product_id: i32, size: &str, count: i32) -> InventoryRecord {
        InventoryRecord::with_sizes(
            ProductId::new(product_id),
            HashMap::from([(Size::from(size), count)]),
        )
    }

    fn one_line_order(user_id: i32) -> NewOrder {
        NewOrder::custom(
            UserId::new(user_id),
            vec![LineInput {
                product_id: ProductId::new(1),
                product_name: "Jersey".to_string(),
                size: None,
                quantity: 1,
                unit_price: Decimal::new(1000, 2),
            }],
            "Calle 1".to_string(),
            "555-0101".to_string(),
            None,
        )
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryOrderStore::new();
        let first = store.create(&one_line_order(1)).await.unwrap();
        let second = store.create(&one_line_order(1)).await.unwrap();
        assert!(second > first);

        let loaded = store.get(second).await.unwrap().expect("order exists");
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let store = InMemoryOrderStore::new();
        let first = store.create(&one_line_order(1)).await.unwrap();
        let second = store.create(&one_line_order(1)).await.unwrap();
        let third = store.create(&one_line_order(2)).await.unwrap();

        let all = store.list(None).await.unwrap();
        let ids: Vec<OrderId> = all.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![third, second, first]);

        let user_one = store.list_for_user(UserId::new(1)).await.unwrap();
        let ids: Vec<OrderId> = user_one.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = InMemoryOrderStore::new();
        let first = store.create(&one_line_order(1)).await.unwrap();
        let second = store.create(&one_line_order(1)).await.unwrap();
        store
            .update_status(first, OrderStatus::Confirmed)
            .await
            .unwrap();

        let pending = store.list(Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.first().map(|o| o.id), Some(second));
    }

    #[tokio::test]
    async fn test_update_status_unknown_order() {
        let store = InMemoryOrderStore::new();
        let err = store
            .update_status(OrderId::new(99), OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let store = InMemoryInventoryStore::new();
        store.put(record(1, "M", 5)).await.unwrap();
        let m = Size::from("M");
        let product = ProductId::new(1);

        assert_eq!(store.decrement(product, &m, 3).await.unwrap(), Some(2));
        // 2 left, asking for 3 must not mutate
        assert_eq!(store.decrement(product, &m, 3).await.unwrap(), None);
        assert_eq!(store.count(product, &m).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_decrement_absent_size_or_product() {
        let store = InMemoryInventoryStore::new();
        store.put(record(1, "M", 5)).await.unwrap();

        let absent_size = store
            .decrement(ProductId::new(1), &Size::from("XL"), 1)
            .await
            .unwrap();
        assert_eq!(absent_size, None);

        let absent_product = store
            .decrement(ProductId::new(2), &Size::from("M"), 1)
            .await
            .unwrap();
        assert_eq!(absent_product, None);
    }

    #[tokio::test]
    async fn test_increment_creates_missing_keys() {
        let store = InMemoryInventoryStore::new();
        assert_eq!(
            store
                .increment(ProductId::new(7), &Size::from("S"), 4)
                .await
                .unwrap(),
            4
        );
        assert_eq!(
            store.count(ProductId::new(7), &Size::from("S")).await.unwrap(),
            4
        );
    }
}
