//! Named-collection document store boundary.
//!
//! Each collection is one JSON document, loaded and saved wholesale. There are
//! no partial updates and no merges: `save` replaces whatever was there.

pub mod in_memory;
pub mod json_file;
pub mod store;

pub use in_memory::InMemoryDocumentStore;
pub use json_file::JsonFileStore;
pub use store::{DocumentStore, StoreError, TypedDocuments};

/// Catalog entries, keyed by product id.
pub const PRODUCTS: &str = "products";
/// Order records, in placement order.
pub const ORDERS: &str = "orders";
/// Customer records, keyed by customer id.
pub const CUSTOMERS: &str = "customers";
