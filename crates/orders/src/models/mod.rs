//! Domain models for the order pipeline.

pub mod cart;
pub mod inventory;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use inventory::InventoryRecord;
pub use order::{
    ExpressOrder, LineInput, NewOrder, NewOrderLine, Order, OrderLine, PlacementOptions,
};
pub use product::Product;
pub use user::{Role, User};
