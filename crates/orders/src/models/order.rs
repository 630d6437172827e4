//! Order aggregates.
//!
//! Two shapes, mirroring the input-vs-entity split used across the store
//! layer: [`NewOrder`] is the unpersisted aggregate produced by assembly, and
//! [`Order`] is what comes back from the store with IDs and a creation
//! timestamp attached.
//!
//! Assembly is pure: the three constructors ([`NewOrder::from_cart`],
//! [`NewOrder::express`], [`NewOrder::custom`]) snapshot product name and
//! unit price from their inputs and perform no store I/O. Once persisted, the
//! snapshots on each line never change, even when the live catalog does.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matchday_core::{OrderId, OrderLineId, OrderStatus, ProductId, Size, UserId};

use super::cart::Cart;
use super::user::User;

/// Optional overrides for cart-based placement.
///
/// Shipping address and phone fall back to the user's profile values when
/// not supplied here.
#[derive(Debug, Clone, Default)]
pub struct PlacementOptions {
    /// Shipping address override.
    pub shipping_address: Option<String>,
    /// Contact phone override.
    pub phone: Option<String>,
    /// Free-form order notes.
    pub notes: Option<String>,
}

/// Input for an express order: a direct single-product purchase.
///
/// Everything is explicit; nothing is defaulted from a profile.
#[derive(Debug, Clone)]
pub struct ExpressOrder {
    /// Purchasing user.
    pub user_id: UserId,
    /// Product bought.
    pub product_id: ProductId,
    /// Product name to snapshot.
    pub product_name: String,
    /// Selected size.
    pub size: Size,
    /// Quantity.
    pub quantity: i32,
    /// Unit price to snapshot.
    pub unit_price: Decimal,
    /// Shipping address.
    pub shipping_address: String,
    /// Contact phone.
    pub phone: String,
}

/// A raw line descriptor for custom assembly.
#[derive(Debug, Clone)]
pub struct LineInput {
    /// Product bought.
    pub product_id: ProductId,
    /// Product name to snapshot.
    pub product_name: String,
    /// Selected size; `M` when absent.
    pub size: Option<Size>,
    /// Quantity.
    pub quantity: i32,
    /// Unit price to snapshot.
    pub unit_price: Decimal,
}

/// An unpersisted order line carrying its snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderLine {
    /// Product bought.
    pub product_id: ProductId,
    /// Product name at assembly time.
    pub product_name: String,
    /// Selected size.
    pub size: Size,
    /// Quantity (at least 1).
    pub quantity: i32,
    /// Unit price at assembly time.
    pub unit_price: Decimal,
}

impl NewOrderLine {
    /// Line subtotal: quantity x unit price snapshot.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An assembled order awaiting persistence.
///
/// Always starts [`OrderStatus::Pending`]. The total is recomputed whenever
/// a line is pushed, so it never diverges from the line subtotals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// Purchasing user.
    pub user_id: UserId,
    /// Initial status (always `Pending`).
    pub status: OrderStatus,
    /// Sum of line subtotals.
    pub total: Decimal,
    /// Shipping address.
    pub shipping_address: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    lines: Vec<NewOrderLine>,
}

impl NewOrder {
    fn empty(
        user_id: UserId,
        shipping_address: Option<String>,
        phone: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            user_id,
            status: OrderStatus::Pending,
            total: Decimal::ZERO,
            shipping_address,
            phone,
            notes,
            lines: Vec::new(),
        }
    }

    /// Assemble an order from a cart, one line per cart item.
    ///
    /// Name and unit price are snapshotted from each item's embedded product;
    /// shipping address and phone default to the user's profile when the
    /// options don't supply them.
    #[must_use]
    pub fn from_cart(cart: &Cart, user: &User, opts: &PlacementOptions) -> Self {
        let mut order = Self::empty(
            user.id,
            opts.shipping_address.clone().or_else(|| user.address.clone()),
            opts.phone.clone().or_else(|| user.phone.clone()),
            opts.notes.clone(),
        );

        for item in cart.items() {
            order.push_line(NewOrderLine {
                product_id: item.product.id,
                product_name: item.product.name.clone(),
                size: item.size.clone(),
                quantity: item.quantity,
                unit_price: item.product.price,
            });
        }

        order
    }

    /// Assemble an express order: a single line from explicit values.
    #[must_use]
    pub fn express(input: ExpressOrder) -> Self {
        let mut order = Self::empty(
            input.user_id,
            Some(input.shipping_address),
            Some(input.phone),
            None,
        );

        order.push_line(NewOrderLine {
            product_id: input.product_id,
            product_name: input.product_name,
            size: input.size,
            quantity: input.quantity,
            unit_price: input.unit_price,
        });

        order
    }

    /// Assemble an order from raw line descriptors.
    ///
    /// A line's size defaults to `M` when absent.
    #[must_use]
    pub fn custom(
        user_id: UserId,
        lines: Vec<LineInput>,
        shipping_address: String,
        phone: String,
        notes: Option<String>,
    ) -> Self {
        let mut order = Self::empty(user_id, Some(shipping_address), Some(phone), notes);

        for line in lines {
            order.push_line(NewOrderLine {
                product_id: line.product_id,
                product_name: line.product_name,
                size: line.size.unwrap_or_default(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        order
    }

    /// Append a line and recompute the total.
    pub fn push_line(&mut self, line: NewOrderLine) {
        self.lines.push(line);
        self.total = self.lines.iter().map(NewOrderLine::subtotal).sum();
    }

    /// The order's lines.
    #[must_use]
    pub fn lines(&self) -> &[NewOrderLine] {
        &self.lines
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_items(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// A persisted order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Unique line ID.
    pub id: OrderLineId,
    /// Order the line belongs to.
    pub order_id: OrderId,
    /// Product bought.
    pub product_id: ProductId,
    /// Product name snapshot, immutable after creation.
    pub product_name: String,
    /// Selected size.
    pub size: Size,
    /// Quantity (at least 1).
    pub quantity: i32,
    /// Unit price snapshot, immutable after creation.
    pub unit_price: Decimal,
}

impl OrderLine {
    /// Line subtotal: quantity x unit price snapshot.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A persisted order.
///
/// Created once at placement and never deleted; after that, the only
/// mutation is the status, and only along the legal transition table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID, assigned by the store.
    pub id: OrderId,
    /// Purchasing user.
    pub user_id: UserId,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Sum of line subtotals.
    pub total: Decimal,
    /// Shipping address.
    pub shipping_address: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Line items in insertion order.
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Move to `target` if the transition table allows it.
    ///
    /// Returns `true` and mutates the status on a legal transition; returns
    /// `false` and leaves the status untouched otherwise.
    pub fn transition(&mut self, target: OrderStatus) -> bool {
        if self.status.can_transition_to(target) {
            self.status = target;
            return true;
        }
        false
    }

    /// Whether the order may still be cancelled.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.status.is_cancellable()
    }

    /// Whether the order reached a terminal status.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_items(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}
