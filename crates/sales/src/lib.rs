//! Sales orders domain module.
//!
//! Orders, their line items, and the persisted record shape of the `orders`
//! collection. Pure domain logic: no IO, no storage.

pub mod order;

pub use order::{Order, OrderItem, OrderItemRecord, OrderRecord, OrderStatus};
