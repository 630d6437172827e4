//! Catalog product snapshot.
//!
//! The product master record is owned by the catalog; the pipeline only ever
//! sees a snapshot of it, carried inside cart items so assembly can freeze
//! name and price without a catalog round trip. The embedded inventory map is
//! likewise a snapshot hydrated from the document store; the live counts are
//! only consulted through the inventory store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matchday_core::{ProductId, Size};

/// A catalog product, as seen by the order pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Current unit price.
    pub price: Decimal,
    /// Catalog category.
    pub category: String,
    /// Team the jersey belongs to, if any.
    pub team: Option<String>,
    /// League the team plays in.
    pub league: Option<String>,
    /// Season the kit was issued for, e.g. "2025/26".
    pub season: Option<String>,
    /// Product image URL.
    pub image_url: Option<String>,
    /// Whether the product is purchasable.
    pub active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// Per-size available counts, snapshotted from the document store.
    pub inventory: HashMap<Size, i32>,
}

impl Product {
    /// Whether the snapshot shows at least `quantity` units of `size`.
    ///
    /// An absent size counts as zero.
    #[must_use]
    pub fn has_stock(&self, size: &Size, quantity: i32) -> bool {
        self.inventory.get(size).copied().unwrap_or(0) >= quantity
    }

    /// Total units across all sizes in the snapshot.
    #[must_use]
    pub fn total_stock(&self) -> i32 {
        self.inventory.values().sum()
    }

    /// Price after applying a percentage discount (0-100).
    #[must_use]
    pub fn discounted_price(&self, percent: Decimal) -> Decimal {
        self.price * (Decimal::ONE - percent / Decimal::ONE_HUNDRED)
    }
}
