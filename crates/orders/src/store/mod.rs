//! Store contracts and adapters.
//!
//! Two independent stores back the pipeline:
//!
//! - [`OrderStore`] - relational; order headers and lines, written together
//!   in a single store-local transaction.
//! - [`InventoryStore`] - document-oriented; one document per product mapping
//!   size labels to counts. Accessed only through single-document operations,
//!   so the two stores never share a transaction boundary.
//!
//! Handles are constructed once at process start and passed into the
//! services as `Arc<dyn ...>` - there is no global store state.
//!
//! # Adapters
//!
//! - [`memory`] - `RwLock`-guarded maps for tests and embedding
//! - [`postgres`] - `PostgreSQL` via sqlx; inventory documents live in a
//!   JSONB column. Schema DDL is under `crates/orders/migrations/`.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use matchday_core::{OrderId, OrderStatus, ProductId, Size, UserId};

use crate::models::{InventoryRecord, NewOrder, Order};

pub use memory::{InMemoryInventoryStore, InMemoryOrderStore};
pub use postgres::{PgInventoryStore, PgOrderStore};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Relational store for order headers and lines.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an assembled order: header plus all lines as one
    /// store-local transaction. Nothing is written if any part fails.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write is rejected or the store is
    /// unreachable.
    async fn create(&self, order: &NewOrder) -> Result<OrderId, StoreError>;

    /// Load an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or a row fails to
    /// decode.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All of a user's orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or a row fails to
    /// decode.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// All orders, optionally filtered by status, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or a row fails to
    /// decode.
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError>;

    /// Persist a new status for an order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order does not exist.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<(), StoreError>;
}

/// Document store for per-product inventory counts.
///
/// Counts stay non-negative because the only way down is [`decrement`],
/// a single atomic conditional write.
///
/// [`decrement`]: InventoryStore::decrement
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Load a product's inventory document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or the document
    /// fails to decode.
    async fn record(&self, product_id: ProductId) -> Result<Option<InventoryRecord>, StoreError>;

    /// Current count for a (product, size); absent documents or sizes read
    /// as zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn count(&self, product_id: ProductId, size: &Size) -> Result<i32, StoreError>;

    /// Create or replace a product's inventory document. Used when the
    /// catalog creates a product, and for seeding.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write is rejected.
    async fn put(&self, record: InventoryRecord) -> Result<(), StoreError>;

    /// Atomically decrement a (product, size) count by `quantity` iff the
    /// current count is at least `quantity`.
    ///
    /// Returns the remaining count on success, or `None` when the condition
    /// did not hold (including a missing document or size). The check and
    /// the write are one operation; concurrent callers cannot both succeed
    /// past the available count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn decrement(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError>;

    /// Increment a (product, size) count by `quantity`, creating the
    /// document or size key if absent. Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn increment(
        &self,
        product_id: ProductId,
        size: &Size,
        quantity: i32,
    ) -> Result<i32, StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Pool capacity; callers block when it is exhausted
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
