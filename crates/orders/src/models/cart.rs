//! Shopping cart.
//!
//! A cart is transient, per-user state. Items are keyed by (product, size):
//! adding the same key again merges quantities instead of duplicating the
//! line. Each item embeds a [`Product`] snapshot so assembly can freeze name
//! and price without going back to the catalog.
//!
//! The stock checks here run against the embedded snapshot only - they are a
//! cheap client-side gate. The authoritative check against live counts is
//! [`StockGuard`](crate::services::StockGuard).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matchday_core::{ProductId, Size, UserId};

use super::product::Product;

/// One cart line: a product snapshot, a size, and a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product snapshot taken when the item was added.
    pub product: Product,
    /// Selected size.
    pub size: Size,
    /// Requested quantity.
    pub quantity: i32,
}

impl CartItem {
    /// Line subtotal: snapshot price x quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A user's shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Owner of the cart.
    pub user_id: UserId,
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
        }
    }

    /// Add a product to the cart, merging with an existing (product, size)
    /// line if present.
    ///
    /// Returns `false` without mutating when the product snapshot does not
    /// show enough stock for the requested quantity.
    pub fn add(&mut self, product: Product, size: Size, quantity: i32) -> bool {
        if !product.has_stock(&size, quantity) {
            return false;
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == product.id && item.size == size)
        {
            item.quantity += quantity;
            return true;
        }

        self.items.push(CartItem {
            product,
            size,
            quantity,
        });
        true
    }

    /// Remove a (product, size) line. Returns `false` if it was not present.
    pub fn remove(&mut self, product_id: ProductId, size: &Size) -> bool {
        let before = self.items.len();
        self.items
            .retain(|item| !(item.product.id == product_id && item.size == *size));
        self.items.len() < before
    }

    /// Replace the quantity of a (product, size) line.
    ///
    /// Returns `false` when the line is absent or the product snapshot does
    /// not show enough stock for the new quantity.
    pub fn update_quantity(&mut self, product_id: ProductId, size: &Size, quantity: i32) -> bool {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == product_id && item.size == *size)
        else {
            return false;
        };

        if !item.product.has_stock(size, quantity) {
            return false;
        }

        item.quantity = quantity;
        true
    }

    /// Empty the cart.
    ///
    /// Never called implicitly: after a successful placement it is the
    /// caller's decision when the cart resets.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The cart's lines.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Total requested units across all lines.
    #[must_use]
    pub fn total_items(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Cart total: sum of line subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
