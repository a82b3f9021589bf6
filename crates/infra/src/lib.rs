//! Infrastructure layer: persistence, inventory, order pipeline, bootstrap.

pub mod config;
pub mod customer_directory;
pub mod document_store;
pub mod inventory_manager;
pub mod order_book;
pub mod order_factory;
pub mod storefront;

#[cfg(test)]
mod integration_tests;

pub use config::StorefrontConfig;
pub use customer_directory::{CustomerDirectory, DirectoryError};
pub use inventory_manager::{InventoryError, InventoryManager};
pub use order_book::{OrderBook, OrderBookError};
pub use order_factory::{NotifierFactory, OrderError, OrderFactory};
pub use storefront::{PlaceOrderError, SharedStore, Storefront};
