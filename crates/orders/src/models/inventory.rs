//! Per-product inventory document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use matchday_core::{ProductId, Size};

/// One inventory document: a product's available count per size.
///
/// Stored independently of the product master record. Counts are kept
/// non-negative by the store's conditional decrement; a size missing from the
/// map reads as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Product the document belongs to.
    pub product_id: ProductId,
    /// Available count per size label.
    pub sizes: HashMap<Size, i32>,
}

impl InventoryRecord {
    /// Create an empty record for a product.
    #[must_use]
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            sizes: HashMap::new(),
        }
    }

    /// Create a record with initial counts.
    #[must_use]
    pub fn with_sizes(product_id: ProductId, sizes: HashMap<Size, i32>) -> Self {
        Self { product_id, sizes }
    }

    /// Count for a size; absent sizes read as zero.
    #[must_use]
    pub fn count(&self, size: &Size) -> i32 {
        self.sizes.get(size).copied().unwrap_or(0)
    }

    /// Whether at least `quantity` units of `size` are available.
    #[must_use]
    pub fn has(&self, size: &Size, quantity: i32) -> bool {
        self.count(size) >= quantity
    }

    /// Total units across all sizes.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.sizes.values().sum()
    }

    /// Set the count for a size.
    pub fn set_count(&mut self, size: Size, count: i32) {
        self.sizes.insert(size, count);
    }
}
