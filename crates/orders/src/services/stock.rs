//! Stock feasibility checking and inventory mutation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use matchday_core::{ProductId, Size};

use crate::models::{Cart, NewOrder};
use crate::store::{InventoryStore, StoreError};

/// Gatekeeper between order placement and the inventory store.
///
/// Feasibility checks are read-only and non-reserving: no lock or hold is
/// taken, so a concurrent request can observe the same counts. The
/// authoritative check is [`decrement`](Self::decrement), whose condition is
/// re-evaluated atomically at commit time.
#[derive(Clone)]
pub struct StockGuard {
    inventory: Arc<dyn InventoryStore>,
}

impl StockGuard {
    /// Create a guard over an inventory store handle.
    #[must_use]
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self { inventory }
    }

    /// Whether the current count covers `quantity` for one (product, size).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the inventory store is unreachable.
    pub async fn feasible(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let count = self.inventory.count(product_id, size).await?;
        Ok(count >= quantity)
    }

    /// Per-line feasibility of a cart against current counts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the inventory store is unreachable.
    pub async fn validate(
        &self,
        cart: &Cart,
    ) -> Result<HashMap<(ProductId, Size), bool>, StoreError> {
        let mut results = HashMap::with_capacity(cart.items().len());
        for item in cart.items() {
            let feasible = self
                .feasible(item.product.id, &item.size, item.quantity)
                .await?;
            results.insert((item.product.id, item.size.clone()), feasible);
        }
        Ok(results)
    }

    /// Whether every cart line is feasible.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the inventory store is unreachable.
    pub async fn all_feasible(&self, cart: &Cart) -> Result<bool, StoreError> {
        let validation = self.validate(cart).await?;
        Ok(validation.values().all(|feasible| *feasible))
    }

    /// First infeasible line of an assembled order, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the inventory store is unreachable.
    pub async fn first_infeasible_line(
        &self,
        order: &NewOrder,
    ) -> Result<Option<(ProductId, Size)>, StoreError> {
        for line in order.lines() {
            if !self.feasible(line.product_id, &line.size, line.quantity).await? {
                return Ok(Some((line.product_id, line.size.clone())));
            }
        }
        Ok(None)
    }

    /// Atomically take `quantity` units, returning the remaining count, or
    /// `None` when the count no longer covers the request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the inventory store is unreachable.
    pub async fn decrement(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        let outcome = self.inventory.decrement(product_id, size, quantity).await?;
        debug!(%product_id, %size, quantity, remaining = ?outcome, "Inventory decrement");
        Ok(outcome)
    }

    /// Give `quantity` units back, returning the new count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the inventory store is unreachable.
    pub async fn restore(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<i32, StoreError> {
        let updated = self.inventory.increment(product_id, size, quantity).await?;
        debug!(%product_id, %size, quantity, updated, "Inventory restore");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use matchday_core::UserId;

    use crate::models::{InventoryRecord, Product};
    use crate::store::InMemoryInventoryStore;

    use super::*;

    fn product(id: i32, snapshot: &[(&str, i32)]) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Jersey {id}"),
            description: String::new(),
            price: Decimal::new(2000, 2),
            category: "jerseys".to_string(),
            team: None,
            league: None,
            season: None,
            image_url: None,
            active: true,
            created_at: Utc::now(),
            inventory: snapshot
                .iter()
                .map(|(size, count)| (Size::from(*size), *count))
                .collect(),
        }
    }

    async fn guard_with(records: &[(i32, &str, i32)]) -> StockGuard {
        let store = Arc::new(InMemoryInventoryStore::new());
        for (product_id, size, count) in records {
            store
                .put(InventoryRecord::with_sizes(
                    ProductId::new(*product_id),
                    StdHashMap::from([(Size::from(*size), *count)]),
                ))
                .await
                .expect("seed inventory");
        }
        StockGuard::new(store)
    }

    #[tokio::test]
    async fn test_validate_maps_each_line() {
        let guard = guard_with(&[(1, "M", 5), (2, "L", 1)]).await;

        let mut cart = Cart::new(UserId::new(1));
        assert!(cart.add(product(1, &[("M", 5)]), Size::from("M"), 3));
        assert!(cart.add(product(2, &[("L", 5)]), Size::from("L"), 2));

        let validation = guard.validate(&cart).await.unwrap();
        assert_eq!(
            validation.get(&(ProductId::new(1), Size::from("M"))),
            Some(&true)
        );
        // live count (1) is below the requested 2, whatever the snapshot said
        assert_eq!(
            validation.get(&(ProductId::new(2), Size::from("L"))),
            Some(&false)
        );
        assert!(!guard.all_feasible(&cart).await.unwrap());
    }

    #[tokio::test]
    async fn test_feasible_treats_absent_as_zero() {
        let guard = guard_with(&[(1, "M", 5)]).await;
        assert!(
            !guard
                .feasible(ProductId::new(1), &Size::from("XS"), 1)
                .await
                .unwrap()
        );
        assert!(
            !guard
                .feasible(ProductId::new(42), &Size::from("M"), 1)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_decrement_and_restore_roundtrip() {
        let guard = guard_with(&[(1, "M", 5)]).await;
        let m = Size::from("M");

        assert_eq!(
            guard.decrement(ProductId::new(1), &m, 3).await.unwrap(),
            Some(2)
        );
        assert_eq!(guard.restore(ProductId::new(1), &m, 3).await.unwrap(), 5);
    }
}
