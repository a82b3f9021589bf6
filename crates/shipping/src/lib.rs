//! Shipping strategies.
//!
//! Each method is a fixed policy: a flat cost and an estimated delivery time.
//! Order contents (weight, distance, item count) never influence the price.

pub mod strategy;

pub use strategy::{
    resolve, DroneShipping, EconomicShipping, FastShipping, ShippingError, ShippingMethod,
    ShippingQuote, ShippingStrategy,
};
