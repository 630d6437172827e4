//! Business services coordinating stores, models, and events.

pub mod orders;
pub mod stock;

pub use orders::OrderService;
pub use stock::StockGuard;
