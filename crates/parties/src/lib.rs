//! Customer accounts.
//!
//! The customer entity, its contact details, and the persisted record shape of
//! the `customers` collection. Credentials live with the authentication layer
//! and are not modelled here.

pub mod customer;

pub use customer::{ContactInfo, Customer, CustomerRecord};
