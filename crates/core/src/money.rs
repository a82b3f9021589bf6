//! Exact-decimal money helpers.
//!
//! Prices and shipping costs are `rust_decimal::Decimal`. On the wire they are
//! decimal strings (`"20.00"`), never JSON floats.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Monetary amount (currency-less; the storefront has a single currency).
pub type Money = Decimal;

/// Reject negative amounts for the named field.
pub fn ensure_non_negative(amount: Money, field: &str) -> DomainResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

/// `unit_price × quantity`, exact.
pub fn line_total(unit_price: Money, quantity: u32) -> Money {
    unit_price * Decimal::from(quantity)
}
