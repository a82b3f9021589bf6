//! Authoritative product catalog + stock levels.
//!
//! The manager owns the mapping product id → catalog entry and writes the full
//! `products` snapshot through the document store after every mutation. When a
//! save fails the in-memory change is undone, so memory and storage never
//! diverge after a call returns.
//!
//! Stock changes go through [`InventoryManager::adjust_stock`] or
//! [`InventoryManager::reserve`]. Entries handed out by `get`/`get_all` are
//! copies; mutating them changes nothing.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use storefront_core::{DomainError, Money, ProductId};
use storefront_products::{CatalogEntry, ProductRecord};

use crate::document_store::{DocumentStore, StoreError, TypedDocuments, PRODUCTS};

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("product not found: {0}")]
    NotFound(String),

    #[error("insufficient stock for product {product_id} (requested {requested}, available {available})")]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    #[error("invalid catalog entry: {0}")]
    InvalidEntry(#[from] DomainError),

    #[error("malformed product record {product_id}: {source}")]
    Malformed {
        product_id: String,
        #[source]
        source: DomainError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("inventory lock poisoned")]
    Poisoned,
}

type Catalog = BTreeMap<ProductId, CatalogEntry>;

/// Process-wide inventory, shared by handle.
#[derive(Debug)]
pub struct InventoryManager<S> {
    store: S,
    products: Mutex<Catalog>,
}

impl<S> InventoryManager<S>
where
    S: DocumentStore,
{
    /// Load the `products` collection (absent → empty catalog).
    pub fn load(store: S) -> Result<Self, InventoryError> {
        let records: BTreeMap<String, ProductRecord> = store.load_as_or_default(PRODUCTS)?;

        let mut products = Catalog::new();
        for (key, record) in records {
            let entry = CatalogEntry::try_from(record)
                .map_err(|source| InventoryError::Malformed { product_id: key, source })?;
            products.insert(entry.id_typed().clone(), entry);
        }

        tracing::info!(products = products.len(), "inventory loaded");
        Ok(Self {
            store,
            products: Mutex::new(products),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Catalog>, InventoryError> {
        self.products.lock().map_err(|_| InventoryError::Poisoned)
    }

    fn persist(&self, products: &Catalog) -> Result<(), InventoryError> {
        let snapshot: BTreeMap<&str, ProductRecord> = products
            .iter()
            .map(|(id, entry)| (id.as_str(), ProductRecord::from(entry)))
            .collect();
        self.store.save_as(PRODUCTS, &snapshot)?;
        tracing::debug!(products = products.len(), "products persisted");
        Ok(())
    }

    /// Persist, or put back the previous values of `touched` keys on failure.
    fn commit(
        &self,
        products: &mut Catalog,
        touched: Vec<(ProductId, Option<CatalogEntry>)>,
    ) -> Result<(), InventoryError> {
        if let Err(err) = self.persist(products) {
            for (id, previous) in touched {
                match previous {
                    Some(entry) => products.insert(id, entry),
                    None => products.remove(&id),
                };
            }
            tracing::warn!(error = %err, "inventory change rolled back");
            return Err(err);
        }
        Ok(())
    }

    /// Insert or overwrite by id.
    pub fn add(&self, entry: CatalogEntry) -> Result<(), InventoryError> {
        let mut products = self.lock()?;
        let id = entry.id_typed().clone();
        let previous = products.insert(id.clone(), entry);
        self.commit(&mut products, vec![(id, previous)])
    }

    /// Delete by id. Returns whether anything was removed; absent ids are a
    /// no-op and do not touch storage.
    pub fn remove(&self, id: &str) -> Result<bool, InventoryError> {
        let mut products = self.lock()?;
        let Some((key, previous)) = products.remove_entry(id) else {
            return Ok(false);
        };
        self.commit(&mut products, vec![(key, Some(previous))])?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Option<CatalogEntry> {
        self.products.lock().ok()?.get(id).cloned()
    }

    /// Change stock by `delta`; returns the new stock level.
    ///
    /// Fails for unknown ids and when the result would be negative, leaving
    /// the entry unchanged.
    pub fn adjust_stock(&self, id: &str, delta: i64) -> Result<u32, InventoryError> {
        let mut products = self.lock()?;
        let current = products
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let next = current.adjusted(delta).map_err(|err| {
            if i64::from(current.stock_quantity()) + delta < 0 {
                InventoryError::InsufficientStock {
                    product_id: current.id_typed().clone(),
                    requested: delta.unsigned_abs(),
                    available: current.stock_quantity(),
                }
            } else {
                InventoryError::InvalidEntry(err)
            }
        })?;

        let stock = next.stock_quantity();
        let key = next.id_typed().clone();
        let previous = products.insert(key.clone(), next);
        self.commit(&mut products, vec![(key, previous)])?;

        tracing::debug!(product_id = id, delta, stock, "stock adjusted");
        Ok(stock)
    }

    /// Atomic reserve-or-fail.
    ///
    /// Checks every line against current stock (quantities for a repeated id
    /// are summed) and only then decrements all of them with a single save.
    /// Any failure leaves every entry unchanged.
    pub fn reserve(&self, lines: &[(ProductId, u32)]) -> Result<(), InventoryError> {
        let mut requested: BTreeMap<&ProductId, u64> = BTreeMap::new();
        for (id, quantity) in lines {
            *requested.entry(id).or_default() += u64::from(*quantity);
        }

        let mut products = self.lock()?;

        let mut updates = Vec::with_capacity(requested.len());
        for (id, quantity) in &requested {
            let entry = products
                .get(*id)
                .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
            let available = entry.stock_quantity();
            if *quantity > u64::from(available) {
                return Err(InventoryError::InsufficientStock {
                    product_id: (*id).clone(),
                    requested: *quantity,
                    available,
                });
            }
            // Cannot fail: quantity <= available.
            updates.push(entry.adjusted(-(*quantity as i64))?);
        }

        if updates.is_empty() {
            return Ok(());
        }

        let touched = updates
            .into_iter()
            .map(|next| {
                let id = next.id_typed().clone();
                let previous = products.insert(id.clone(), next);
                (id, previous)
            })
            .collect();
        self.commit(&mut products, touched)?;

        tracing::debug!(lines = requested.len(), "stock reserved");
        Ok(())
    }

    /// Give back stock taken by [`InventoryManager::reserve`].
    ///
    /// Every id must exist; quantities for a repeated id are summed. All
    /// entries are incremented with a single save, or none are.
    pub fn release(&self, lines: &[(ProductId, u32)]) -> Result<(), InventoryError> {
        let mut returned: BTreeMap<&ProductId, i64> = BTreeMap::new();
        for (id, quantity) in lines {
            *returned.entry(id).or_default() += i64::from(*quantity);
        }

        let mut products = self.lock()?;

        let mut updates = Vec::with_capacity(returned.len());
        for (id, quantity) in &returned {
            let entry = products
                .get(*id)
                .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
            updates.push(entry.adjusted(*quantity)?);
        }

        if updates.is_empty() {
            return Ok(());
        }

        let touched = updates
            .into_iter()
            .map(|next| {
                let id = next.id_typed().clone();
                let previous = products.insert(id.clone(), next);
                (id, previous)
            })
            .collect();
        self.commit(&mut products, touched)?;

        tracing::debug!(lines = returned.len(), "stock released");
        Ok(())
    }

    /// Administrative edit of name, description, price and category. Stock is
    /// left as is.
    pub fn update_details(
        &self,
        id: &str,
        name: &str,
        description: &str,
        price: Money,
        category: &str,
    ) -> Result<CatalogEntry, InventoryError> {
        let mut products = self.lock()?;
        let current = products
            .get(id)
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        let next = current.with_details(name, description, price, category)?;
        let key = next.id_typed().clone();
        let previous = products.insert(key.clone(), next.clone());
        self.commit(&mut products, vec![(key, previous)])?;
        Ok(next)
    }

    /// Snapshot copy of the whole catalog.
    pub fn get_all(&self) -> BTreeMap<ProductId, CatalogEntry> {
        self.products
            .lock()
            .map(|products| products.clone())
            .unwrap_or_default()
    }

    /// Entries whose category equals `category` exactly.
    pub fn get_by_category(&self, category: &str) -> BTreeMap<ProductId, CatalogEntry> {
        self.filtered(|entry| entry.category() == category)
    }

    /// Entries whose name or category contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<CatalogEntry> {
        self.filtered(|entry| entry.matches(term)).into_values().collect()
    }

    fn filtered(&self, keep: impl Fn(&CatalogEntry) -> bool) -> BTreeMap<ProductId, CatalogEntry> {
        match self.products.lock() {
            Ok(products) => products
                .iter()
                .filter(|(_, entry)| keep(*entry))
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect(),
            Err(_) => BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
