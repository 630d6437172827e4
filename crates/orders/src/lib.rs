//! Matchday Orders - order placement and lifecycle pipeline.
//!
//! This crate coordinates two independent stores: a relational store holding
//! order headers and lines, and a document store holding per-size inventory
//! counts. The stores share no transaction boundary, so the pipeline
//! approximates atomicity with an ordered commit sequence and compensating
//! actions:
//!
//! 1. [`StockGuard`] checks feasibility (advisory, non-reserving).
//! 2. [`NewOrder`] assembly snapshots product name and unit price.
//! 3. [`store::OrderStore::create`] writes header + lines in one relational
//!    transaction.
//! 4. Each line's inventory count is reduced with a single atomic
//!    "decrement iff count is sufficient" document write, re-validated at
//!    commit time. If any line fails, already-decremented lines are restored
//!    and the committed order is marked cancelled.
//! 5. [`EventBus`] dispatches the resulting event to observers, outside the
//!    transactional path.
//!
//! # Modules
//!
//! - [`models`] - Domain aggregates: products, users, carts, orders
//! - [`store`] - Store traits plus in-memory and PostgreSQL adapters
//! - [`events`] - Publish/subscribe dispatch with bounded history
//! - [`services`] - [`StockGuard`] and the [`OrderService`] orchestrator
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Service-level error taxonomy
//!
//! # Wiring
//!
//! Store handles are constructed once at process start and passed in
//! explicitly; nothing in the crate holds global state.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use matchday_orders::events::LogObserver;
//! use matchday_orders::store::{self, PgInventoryStore, PgOrderStore};
//! use matchday_orders::{EventBus, EventKind, OrderService, OrdersConfig};
//!
//! # async fn wiring() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OrdersConfig::load()?;
//! let pool = store::create_pool(&config.database_url, config.max_db_connections).await?;
//!
//! let events = Arc::new(EventBus::with_capacity(config.event_history_capacity));
//! events.attach(EventKind::OrderCreated, Arc::new(LogObserver));
//!
//! let service = OrderService::new(
//!     Arc::new(PgOrderStore::new(pool.clone())),
//!     Arc::new(PgInventoryStore::new(pool)),
//!     events,
//! )
//! .with_low_stock_threshold(config.low_stock_threshold);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod store;

pub use config::OrdersConfig;
pub use error::OrderError;
pub use events::{Event, EventBus, EventKind, EventObserver, ObserverError};
pub use models::{
    Cart, CartItem, ExpressOrder, InventoryRecord, LineInput, NewOrder, NewOrderLine, Order,
    OrderLine, PlacementOptions, Product, Role, User,
};
pub use services::{OrderService, StockGuard};
