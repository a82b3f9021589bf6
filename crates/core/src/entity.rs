//! Entity trait: identity + continuity across state changes.
//!
//! Catalog entries, orders, and customers are entities: two values with the
//! same id describe the same thing, even if every other field differs.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Whether `other` refers to the same entity, regardless of its state.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
