use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::money::ensure_non_negative;
use storefront_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Catalog entry: a sellable product and its stock level.
///
/// Stock is unsigned, so "never negative" holds by construction. Changing stock
/// goes through [`CatalogEntry::adjusted`], which returns a new entry instead of
/// mutating in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    id: ProductId,
    name: String,
    description: String,
    price: Money,
    category: String,
    stock_quantity: u32,
}

impl CatalogEntry {
    /// Create a catalog entry with a fresh identifier.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        stock_quantity: u32,
    ) -> DomainResult<Self> {
        Self::with_id(ProductId::new(), name, description, price, category, stock_quantity)
    }

    /// Create a catalog entry with an explicit identifier.
    pub fn with_id(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        stock_quantity: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_non_negative(price, "price")?;

        Ok(Self {
            id,
            name,
            description: description.into(),
            price,
            category: category.into(),
            stock_quantity,
        })
    }

    pub fn id_typed(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    /// Available for sale iff at least one unit is in stock.
    pub fn is_available(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Whether `quantity` units can be taken from this entry right now.
    pub fn can_fulfil(&self, quantity: u32) -> bool {
        self.is_available() && self.stock_quantity >= quantity
    }

    /// Entry with stock changed by `delta`.
    ///
    /// Fails if the result would be negative (or overflow `u32`); `self` is
    /// left untouched either way.
    pub fn adjusted(&self, delta: i64) -> DomainResult<Self> {
        let new_stock = i64::from(self.stock_quantity) + delta;
        if new_stock < 0 {
            return Err(DomainError::invariant("stock cannot go negative"));
        }
        let stock_quantity = u32::try_from(new_stock)
            .map_err(|_| DomainError::invariant("stock exceeds supported range"))?;

        Ok(Self {
            stock_quantity,
            ..self.clone()
        })
    }

    /// Entry with new descriptive fields and price; stock is kept.
    pub fn with_details(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
    ) -> DomainResult<Self> {
        Self::with_id(
            self.id.clone(),
            name,
            description,
            price,
            category,
            self.stock_quantity,
        )
    }

    /// Case-insensitive substring match over name or category.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.category.to_lowercase().contains(&term)
    }
}

impl Entity for CatalogEntry {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persisted shape of a catalog entry inside the `products` collection.
///
/// `price` is a decimal string so values round-trip without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    pub stock_quantity: u32,
}

impl From<&CatalogEntry> for ProductRecord {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            price: entry.price,
            category: entry.category.clone(),
            stock_quantity: entry.stock_quantity,
        }
    }
}

impl TryFrom<ProductRecord> for CatalogEntry {
    type Error = DomainError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        CatalogEntry::with_id(
            record.id,
            record.name,
            record.description,
            record.price,
            record.category,
            record.stock_quantity,
        )
    }
}
