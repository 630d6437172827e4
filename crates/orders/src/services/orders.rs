//! Order orchestration.
//!
//! `OrderService` sequences the placement and lifecycle pipeline across the
//! two stores and the event bus. The stores never share a transaction; the
//! consistency contract is documented per operation below, and its one
//! irreducible gap - a process crash between the relational commit and the
//! inventory compensation - is only recoverable by out-of-band
//! reconciliation.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, instrument, warn};

use matchday_core::{OrderId, OrderStatus, ProductId, Size, UserId};

use crate::error::OrderError;
use crate::events::{EventBus, EventKind};
use crate::models::{Cart, ExpressOrder, LineInput, NewOrder, Order, PlacementOptions, User};
use crate::store::{InventoryStore, OrderStore};

use super::stock::StockGuard;

/// Remaining count at or below which `LowStock` fires, unless configured.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

/// Top-level coordinator for order placement and lifecycle management.
///
/// Holds explicit store handles constructed once at process start; it keeps
/// no global state of its own.
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    stock: StockGuard,
    events: Arc<EventBus>,
    low_stock_threshold: i32,
}

impl OrderService {
    /// Create a service over the given store handles and event bus.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        inventory: Arc<dyn InventoryStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            orders,
            stock: StockGuard::new(inventory),
            events,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    /// Override the low-stock alert threshold.
    #[must_use]
    pub const fn with_low_stock_threshold(mut self, threshold: i32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Place an order from a cart.
    ///
    /// Sequence: feasibility gate, assembly (snapshotting name/price,
    /// defaulting address/phone from the user profile), transactional
    /// header+lines write, then per-line conditional inventory decrement.
    /// If a line fails at decrement time - a concurrent order got there
    /// first - every already-decremented line is restored, the committed
    /// order is marked cancelled, and the call fails with
    /// [`OrderError::InsufficientStock`].
    ///
    /// The cart is left untouched; clearing it after a successful placement
    /// is the caller's call, via [`Cart::clear`].
    ///
    /// # Errors
    ///
    /// [`OrderError::EmptyCart`] or [`OrderError::InsufficientStock`] before
    /// any mutation; [`OrderError::Store`] if a store operation fails.
    #[instrument(skip(self, cart, user), fields(user_id = %user.id))]
    pub async fn place_order(
        &self,
        cart: &Cart,
        user: &User,
        opts: PlacementOptions,
    ) -> Result<OrderId, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let validation = self.stock.validate(cart).await?;
        if let Some(((product_id, size), _)) =
            validation.iter().find(|(_, feasible)| !**feasible)
        {
            info!(%product_id, %size, "Rejected placement: insufficient stock");
            return Err(OrderError::InsufficientStock {
                product_id: *product_id,
                size: size.clone(),
            });
        }

        let draft = NewOrder::from_cart(cart, user, &opts);
        self.commit(draft, Some(user)).await
    }

    /// Place an express order: a direct single-product purchase with
    /// explicit shipping details.
    ///
    /// # Errors
    ///
    /// [`OrderError::InsufficientStock`] before any mutation;
    /// [`OrderError::Store`] if a store operation fails.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, product_id = %input.product_id))]
    pub async fn place_express(&self, input: ExpressOrder) -> Result<OrderId, OrderError> {
        let draft = NewOrder::express(input);
        self.gate(&draft).await?;
        self.commit(draft, None).await
    }

    /// Place an order from raw line descriptors.
    ///
    /// # Errors
    ///
    /// [`OrderError::EmptyCart`] when `lines` is empty;
    /// [`OrderError::InsufficientStock`] before any mutation;
    /// [`OrderError::Store`] if a store operation fails.
    #[instrument(skip_all, fields(user_id = %user_id, lines = lines.len()))]
    pub async fn place_custom(
        &self,
        user_id: UserId,
        lines: Vec<LineInput>,
        shipping_address: String,
        phone: String,
        notes: Option<String>,
    ) -> Result<OrderId, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let draft = NewOrder::custom(user_id, lines, shipping_address, phone, notes);
        self.gate(&draft).await?;
        self.commit(draft, None).await
    }

    /// Cancel an order and restore its stock.
    ///
    /// Returns `Ok(false)` without mutating anything when the order is past
    /// cancellation (shipped, delivered, or already cancelled). On success
    /// every line's quantity is incremented back before the status flips to
    /// `Cancelled`.
    ///
    /// # Errors
    ///
    /// [`OrderError::NotFound`] for an unknown order; [`OrderError::Store`]
    /// if a store operation fails. A store failure mid-restoration leaves
    /// the already-restored lines in place and the status unchanged - the
    /// error surfaces rather than rolling back.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<bool, OrderError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if !order.is_cancellable() {
            info!(status = %order.status, "Rejected cancellation");
            return Ok(false);
        }

        for line in &order.lines {
            if let Err(err) = self
                .stock
                .restore(line.product_id, &line.size, line.quantity)
                .await
            {
                error!(
                    %order_id,
                    product_id = %line.product_id,
                    size = %line.size,
                    error = %err,
                    "Stock restoration failed part-way; counts need reconciliation"
                );
                return Err(err.into());
            }
        }

        if !order.transition(OrderStatus::Cancelled) {
            return Ok(false);
        }
        self.orders
            .update_status(order_id, OrderStatus::Cancelled)
            .await?;

        info!(%order_id, "Order cancelled, stock restored");
        self.events.notify(
            EventKind::OrderCancelled,
            json!({
                "order_id": order_id,
                "user_id": order.user_id,
                "refund_total": order.total,
                "summary": format!("Order #{order_id} cancelled. Stock restored."),
            }),
        );

        Ok(true)
    }

    /// Move an order to a new status.
    ///
    /// Returns `Ok(false)` without mutating or notifying when the transition
    /// table disallows the move.
    ///
    /// # Errors
    ///
    /// [`OrderError::NotFound`] for an unknown order; [`OrderError::Store`]
    /// if persisting the new status fails.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<bool, OrderError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        let previous = order.status;
        if !order.transition(target) {
            info!(%previous, %target, "Rejected status transition");
            return Ok(false);
        }

        self.orders.update_status(order_id, target).await?;

        info!(%order_id, %previous, %target, "Order status updated");
        self.events.notify(
            EventKind::OrderUpdated,
            json!({
                "order_id": order_id,
                "user_id": order.user_id,
                "previous_status": previous,
                "new_status": target,
                "summary": format!("Order #{order_id} moved to {target}"),
            }),
        );

        Ok(true)
    }

    /// Load one order with its lines.
    ///
    /// # Errors
    ///
    /// [`OrderError::Store`] if the store is unreachable.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.get(order_id).await?)
    }

    /// A user's orders, most recent first.
    ///
    /// # Errors
    ///
    /// [`OrderError::Store`] if the store is unreachable.
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// All orders, optionally filtered by status, most recent first.
    ///
    /// # Errors
    ///
    /// [`OrderError::Store`] if the store is unreachable.
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list(status).await?)
    }

    /// Feasibility gate for the express/custom paths, mirroring the cart
    /// validation in [`place_order`](Self::place_order).
    async fn gate(&self, draft: &NewOrder) -> Result<(), OrderError> {
        if let Some((product_id, size)) = self.stock.first_infeasible_line(draft).await? {
            info!(%product_id, %size, "Rejected placement: insufficient stock");
            return Err(OrderError::InsufficientStock { product_id, size });
        }
        Ok(())
    }

    /// Commit an assembled order: transactional write, then per-line
    /// conditional decrement with compensation, then events.
    async fn commit(&self, draft: NewOrder, user: Option<&User>) -> Result<OrderId, OrderError> {
        let order_id = self.orders.create(&draft).await?;
        info!(%order_id, total = %draft.total, "Order committed");

        // (product, size, taken, remaining) for every line decremented so far
        let mut decremented: Vec<(ProductId, Size, i32, i32)> = Vec::new();
        for line in draft.lines() {
            let outcome = match self
                .stock
                .decrement(line.product_id, &line.size, line.quantity)
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.compensate(order_id, &decremented).await;
                    return Err(err.into());
                }
            };

            match outcome {
                Some(remaining) => {
                    decremented.push((line.product_id, line.size.clone(), line.quantity, remaining));
                }
                None => {
                    self.compensate(order_id, &decremented).await;
                    return Err(OrderError::InsufficientStock {
                        product_id: line.product_id,
                        size: line.size.clone(),
                    });
                }
            }
        }

        for (product_id, size, _, remaining) in &decremented {
            if *remaining == 0 {
                self.events.notify(
                    EventKind::OutOfStock,
                    json!({"product_id": product_id, "size": size, "remaining": 0}),
                );
            } else if *remaining <= self.low_stock_threshold {
                self.events.notify(
                    EventKind::LowStock,
                    json!({"product_id": product_id, "size": size, "remaining": remaining}),
                );
            }
        }

        let summary = user.map_or_else(
            || format!("New order #{order_id} placed"),
            |user| format!("New order #{order_id} placed for {}", user.name),
        );
        self.events.notify(
            EventKind::OrderCreated,
            json!({
                "order_id": order_id,
                "user_id": draft.user_id,
                "email": user.map(|u| u.email.clone()),
                "total": draft.total,
                "items": draft.total_items(),
                "summary": summary,
            }),
        );

        Ok(order_id)
    }

    /// Undo the inventory half of a placement whose decrement sequence
    /// failed part-way: restore what was taken and mark the committed order
    /// cancelled. Restoration failures are logged, not propagated - the
    /// original failure is what the caller needs to see.
    async fn compensate(&self, order_id: OrderId, decremented: &[(ProductId, Size, i32, i32)]) {
        warn!(%order_id, restored_lines = decremented.len(), "Compensating failed placement");

        for (product_id, size, taken, _) in decremented {
            if let Err(err) = self.stock.restore(*product_id, size, *taken).await {
                error!(
                    %order_id,
                    %product_id,
                    %size,
                    error = %err,
                    "Compensation restore failed; counts need reconciliation"
                );
            }
        }

        if let Err(err) = self
            .orders
            .update_status(order_id, OrderStatus::Cancelled)
            .await
        {
            error!(%order_id, error = %err, "Could not mark compensated order cancelled");
        }
    }
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("low_stock_threshold", &self.low_stock_threshold)
            .finish_non_exhaustive()
    }
}
