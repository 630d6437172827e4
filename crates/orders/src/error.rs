//! Unified error handling for the order pipeline.

use matchday_core::{OrderId, ProductId, Size};
use thiserror::Error;

use crate::store::StoreError;

/// Service-level error type for order operations.
///
/// Validation failures (`InsufficientStock`, `EmptyCart`) and `NotFound` are
/// detected before any mutation and carry zero side effects. `Store` wraps a
/// persistence failure; whether state was already committed when it occurred
/// is documented per operation on
/// [`OrderService`](crate::services::OrderService).
#[derive(Debug, Error)]
pub enum OrderError {
    /// A requested (product, size) line exceeds the available count.
    #[error("insufficient stock for product {product_id} size {size}")]
    InsufficientStock {
        /// Product whose inventory fell short.
        product_id: ProductId,
        /// Size label that fell short.
        size: Size,
    },

    /// Order placement was attempted with no lines.
    #[error("cannot place an order from an empty cart")]
    EmptyCart,

    /// No order exists with the given ID.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// A store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
