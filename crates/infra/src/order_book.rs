//! Persisted order history (`orders` collection).
//!
//! The collection is a JSON array of [`OrderRecord`]s. Each operation reads it,
//! applies the change and writes it back under a process-local guard.

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use storefront_core::{CustomerId, OrderId};
use storefront_sales::{Order, OrderRecord, OrderStatus};

use crate::document_store::{DocumentStore, StoreError, TypedDocuments, ORDERS};

#[derive(Debug, Error)]
pub enum OrderBookError {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("order book lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
pub struct OrderBook<S> {
    store: S,
    guard: Mutex<()>,
}

impl<S> OrderBook<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, OrderBookError> {
        self.guard.lock().map_err(|_| OrderBookError::Poisoned)
    }

    fn read(&self) -> Result<Vec<OrderRecord>, OrderBookError> {
        Ok(self.store.load_as_or_default(ORDERS)?)
    }

    fn write(&self, records: &[OrderRecord]) -> Result<(), OrderBookError> {
        self.store.save_as(ORDERS, records)?;
        tracing::debug!(orders = records.len(), "orders persisted");
        Ok(())
    }

    /// Append `order` to the collection.
    pub fn record(&self, order: &Order) -> Result<OrderRecord, OrderBookError> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        let record = OrderRecord::from(order);
        records.push(record.clone());
        self.write(&records)?;
        Ok(record)
    }

    /// Every order, oldest first.
    pub fn list(&self) -> Result<Vec<OrderRecord>, OrderBookError> {
        let _guard = self.lock()?;
        self.read()
    }

    pub fn for_customer(&self, customer_id: &CustomerId) -> Result<Vec<OrderRecord>, OrderBookError> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        records.retain(|r| &r.customer_id == customer_id);
        Ok(records)
    }

    pub fn get(&self, id: &OrderId) -> Result<Option<OrderRecord>, OrderBookError> {
        let _guard = self.lock()?;
        Ok(self.read()?.into_iter().find(|r| &r.id == id))
    }

    /// Set the status of a stored order. Any status may follow any other.
    pub fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<OrderRecord, OrderBookError> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| OrderBookError::NotFound(id.clone()))?;

        let previous = record.status;
        record.status = status;
        let updated = record.clone();
        self.write(&records)?;

        tracing::info!(order_id = %id, from = %previous, to = %status, "order status updated");
        Ok(updated)
    }

    /// Drop every order of `customer_id`; returns how many were removed.
    pub fn remove_for_customer(&self, customer_id: &CustomerId) -> Result<usize, OrderBookError> {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        let before = records.len();
        records.retain(|r| &r.customer_id != customer_id);
        let removed = before - records.len();
        if removed > 0 {
            self.write(&records)?;
        }
        Ok(removed)
    }
}
