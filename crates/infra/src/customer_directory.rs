//! Registered customers (`customers` collection).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;

use storefront_core::{CustomerId, DomainError};
use storefront_parties::{ContactInfo, Customer, CustomerRecord};

use crate::document_store::{DocumentStore, StoreError, TypedDocuments, CUSTOMERS};
use crate::order_book::{OrderBook, OrderBookError};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("customer not found: {0}")]
    NotFound(CustomerId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Orders(#[from] OrderBookError),

    #[error("customer directory lock poisoned")]
    Poisoned,
}

type Records = BTreeMap<String, CustomerRecord>;

#[derive(Debug)]
pub struct CustomerDirectory<S> {
    store: S,
    guard: Mutex<()>,
}

impl<S> CustomerDirectory<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, DirectoryError> {
        self.guard.lock().map_err(|_| DirectoryError::Poisoned)
    }

    fn read(&self) -> Result<Records, DirectoryError> {
        Ok(self.store.load_as_or_default(CUSTOMERS)?)
    }

    fn write(&self, records: &Records) -> Result<(), DirectoryError> {
        self.store.save_as(CUSTOMERS, records)?;
        tracing::debug!(customers = records.len(), "customers persisted");
        Ok(())
    }

    /// Create a customer with a fresh id.
    ///
    /// Email must be unique (exact comparison).
    pub fn register(
        &self,
        name: &str,
        email: &str,
        address: &str,
        phone: &str,
    ) -> Result<Customer, DirectoryError> {
        let customer = Customer::new(
            CustomerId::new(),
            name,
            email,
            ContactInfo {
                address: address.to_string(),
                phone: phone.to_string(),
            },
            Utc::now(),
        )?;

        let _guard = self.lock()?;
        let mut records = self.read()?;
        if records.values().any(|r| r.email == email) {
            return Err(DomainError::conflict(format!("email already registered: {email}")).into());
        }

        records.insert(customer.id_typed().to_string(), CustomerRecord::from(&customer));
        self.write(&records)?;

        tracing::info!(customer_id = %customer.id_typed(), "customer registered");
        Ok(customer)
    }

    pub fn get(&self, id: &CustomerId) -> Result<Option<Customer>, DirectoryError> {
        let _guard = self.lock()?;
        self.read()?
            .remove(id.as_str())
            .map(Customer::try_from)
            .transpose()
            .map_err(DirectoryError::from)
    }

    /// All customers, ordered by id.
    pub fn list(&self) -> Result<Vec<Customer>, DirectoryError> {
        let _guard = self.lock()?;
        self.read()?
            .into_values()
            .map(|r| Customer::try_from(r).map_err(DirectoryError::from))
            .collect()
    }

    /// Customers whose name or email contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Result<Vec<Customer>, DirectoryError> {
        let mut customers = self.list()?;
        customers.retain(|c| c.matches(term));
        Ok(customers)
    }

    /// Delete the customer and every order they placed.
    ///
    /// Returns the number of orders removed along with the customer.
    pub fn remove<O>(&self, id: &CustomerId, orders: &OrderBook<O>) -> Result<usize, DirectoryError>
    where
        O: DocumentStore,
    {
        let _guard = self.lock()?;
        let mut records = self.read()?;
        if records.remove(id.as_str()).is_none() {
            return Err(DirectoryError::NotFound(id.clone()));
        }

        let removed_orders = orders.remove_for_customer(id)?;
        self.write(&records)?;

        tracing::info!(customer_id = %id, removed_orders, "customer removed");
        Ok(removed_orders)
    }
}
