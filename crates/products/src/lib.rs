//! Product catalog domain module.
//!
//! A catalog entry is the sellable item plus its stock level. Stock changes are
//! owned by the inventory manager in `storefront-infra`; this crate only holds
//! the value type, its validation rules, and the persisted record shape.

pub mod product;

pub use product::{CatalogEntry, ProductRecord};
