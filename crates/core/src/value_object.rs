//! Value object trait: equality by value, not identity.
//!
//! An order item or a shipping quote has no identity of its own: two items for
//! the same product, quantity and captured price are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. In this workspace:
///
/// - `OrderItem` (product reference, quantity, captured unit price)
/// - `ShippingQuote` (method, cost, estimated days)
///
/// ```ignore
/// let a = OrderItem::capture(&entry, 2)?;
/// let b = OrderItem::capture(&entry, 2)?;
/// assert_eq!(a, b); // equal by value, not identity
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
