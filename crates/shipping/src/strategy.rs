use core::str::FromStr;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::{Money, ValueObject};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingError {
    /// No strategy is registered under that name (after lowercasing).
    #[error("unknown shipping strategy: {0}")]
    UnknownStrategy(String),
}

/// Shipping methods offered by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Fast,
    Economic,
    Drone,
}

impl ShippingMethod {
    /// Every method, in the order they are offered to customers.
    pub fn available() -> [ShippingMethod; 3] {
        [ShippingMethod::Fast, ShippingMethod::Economic, ShippingMethod::Drone]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShippingMethod::Fast => "fast",
            ShippingMethod::Economic => "economic",
            ShippingMethod::Drone => "drone",
        }
    }

    /// The pricing policy behind this method.
    pub fn strategy(self) -> &'static dyn ShippingStrategy {
        match self {
            ShippingMethod::Fast => &FastShipping,
            ShippingMethod::Economic => &EconomicShipping,
            ShippingMethod::Drone => &DroneShipping,
        }
    }
}

impl core::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethod {
    type Err = ShippingError;

    /// Case-insensitive; no trimming, no partial matches, no fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(ShippingMethod::Fast),
            "economic" => Ok(ShippingMethod::Economic),
            "drone" => Ok(ShippingMethod::Drone),
            _ => Err(ShippingError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Cost/ETA policy for one shipping method.
pub trait ShippingStrategy: Send + Sync + core::fmt::Debug {
    fn method(&self) -> ShippingMethod;

    /// Lowercase name the strategy is resolved by.
    fn name(&self) -> &'static str {
        self.method().as_str()
    }

    /// Flat shipping cost for an order.
    fn cost(&self) -> Money;

    /// Estimated delivery time in days.
    fn estimated_days(&self) -> u32;

    fn quote(&self) -> ShippingQuote {
        ShippingQuote {
            method: self.method(),
            cost: self.cost(),
            estimated_days: self.estimated_days(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FastShipping;

impl ShippingStrategy for FastShipping {
    fn method(&self) -> ShippingMethod {
        ShippingMethod::Fast
    }

    fn cost(&self) -> Money {
        dec!(50.00)
    }

    fn estimated_days(&self) -> u32 {
        2
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EconomicShipping;

impl ShippingStrategy for EconomicShipping {
    fn method(&self) -> ShippingMethod {
        ShippingMethod::Economic
    }

    fn cost(&self) -> Money {
        dec!(10.00)
    }

    fn estimated_days(&self) -> u32 {
        5
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroneShipping;

impl ShippingStrategy for DroneShipping {
    fn method(&self) -> ShippingMethod {
        ShippingMethod::Drone
    }

    fn cost(&self) -> Money {
        dec!(100.00)
    }

    fn estimated_days(&self) -> u32 {
        1
    }
}

/// Resolve a shipping strategy by name (case-insensitive).
pub fn resolve(name: &str) -> Result<&'static dyn ShippingStrategy, ShippingError> {
    name.parse::<ShippingMethod>().map(ShippingMethod::strategy)
}

/// Snapshot of a strategy's terms, attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingQuote {
    pub method: ShippingMethod,
    pub cost: Money,
    pub estimated_days: u32,
}

impl ValueObject for ShippingQuote {}
