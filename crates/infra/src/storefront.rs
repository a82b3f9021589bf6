//! Process bootstrap: one shared store, inventory, hub and log, wired into the
//! order pipeline.
//!
//! Every component is created exactly once here and handed out by reference
//! or `Arc`; nothing is process-global.

use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;

use storefront_core::{OrderId, ProductId};
use storefront_notifications::{NotificationHub, NotificationLog};
use storefront_parties::Customer;
use storefront_products::CatalogEntry;
use storefront_sales::{Order, OrderRecord, OrderStatus};

use crate::config::StorefrontConfig;
use crate::customer_directory::CustomerDirectory;
use crate::document_store::{DocumentStore, JsonFileStore};
use crate::inventory_manager::{InventoryError, InventoryManager};
use crate::order_book::{OrderBook, OrderBookError};
use crate::order_factory::{OrderError, OrderFactory};

pub type SharedStore = Arc<dyn DocumentStore>;

#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Recording the order failed; its stock reservation was released.
    #[error("order {order_id} could not be recorded: {source}")]
    Record {
        order_id: OrderId,
        #[source]
        source: OrderBookError,
    },
}

#[derive(Debug)]
pub struct Storefront {
    store: SharedStore,
    inventory: Arc<InventoryManager<SharedStore>>,
    hub: Arc<NotificationHub>,
    notification_log: Arc<NotificationLog>,
    factory: OrderFactory<SharedStore>,
    orders: OrderBook<SharedStore>,
    customers: CustomerDirectory<SharedStore>,
}

impl Storefront {
    /// Read config from the environment, install tracing, open the storefront.
    pub fn bootstrap() -> anyhow::Result<Self> {
        let config = StorefrontConfig::from_env()?;
        storefront_observability::tracing::init_with(config.log_format);
        Self::open(&config)
    }

    /// Open the JSON data directory and notification log named by `config`.
    pub fn open(config: &StorefrontConfig) -> anyhow::Result<Self> {
        let store = JsonFileStore::open(&config.data_dir)
            .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;
        let log = NotificationLog::open(&config.notification_log).with_context(|| {
            format!(
                "failed to open notification log {}",
                config.notification_log.display()
            )
        })?;

        let storefront = Self::with_store(Arc::new(store), Arc::new(log))
            .context("failed to load inventory")?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            products = storefront.inventory.len(),
            "storefront opened"
        );
        Ok(storefront)
    }

    /// Wire the pipeline over an existing store and log.
    pub fn with_store(store: SharedStore, log: Arc<NotificationLog>) -> Result<Self, InventoryError> {
        let inventory = Arc::new(InventoryManager::load(store.clone())?);
        let hub = Arc::new(NotificationHub::new());
        let factory = OrderFactory::with_log(inventory.clone(), hub.clone(), log.clone());

        Ok(Self {
            orders: OrderBook::new(store.clone()),
            customers: CustomerDirectory::new(store.clone()),
            store,
            inventory,
            hub,
            notification_log: log,
            factory,
        })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn inventory(&self) -> &Arc<InventoryManager<SharedStore>> {
        &self.inventory
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    pub fn notification_log(&self) -> &Arc<NotificationLog> {
        &self.notification_log
    }

    pub fn factory(&self) -> &OrderFactory<SharedStore> {
        &self.factory
    }

    pub fn orders(&self) -> &OrderBook<SharedStore> {
        &self.orders
    }

    pub fn customers(&self) -> &CustomerDirectory<SharedStore> {
        &self.customers
    }

    /// Look up current catalog entries, create the order and record it.
    ///
    /// The order is stored before the customer is notified or their history
    /// changes. If storing fails, the reserved stock is given back and the
    /// customer is left as it was.
    pub fn place_order(
        &self,
        customer: &mut Customer,
        lines: &[(ProductId, u32)],
        shipping_method: &str,
        shipping_address: &str,
    ) -> Result<Order, PlaceOrderError> {
        let entries = lines
            .iter()
            .map(|(id, quantity)| {
                self.inventory
                    .get(id.as_str())
                    .map(|entry| (entry, *quantity))
                    .ok_or_else(|| OrderError::UnknownProduct(id.to_string()))
            })
            .collect::<Result<Vec<(CatalogEntry, u32)>, _>>()?;

        let order = self
            .factory
            .prepare_order(customer, &entries, shipping_method, shipping_address)?;

        if let Err(source) = self.orders.record(&order) {
            tracing::error!(order_id = %order.id_typed(), error = %source, "failed to record order");
            if let Err(err) = self.factory.cancel_reservation(&order) {
                tracing::error!(order_id = %order.id_typed(), error = %err, "failed to release reserved stock");
            }
            return Err(PlaceOrderError::Record {
                order_id: order.id_typed().clone(),
                source,
            });
        }

        self.factory.confirm_order(customer, &order);
        Ok(order)
    }

    pub fn update_order_status(&self, id: &OrderId, status: OrderStatus) -> Result<OrderRecord, OrderBookError> {
        self.orders.update_status(id, status)
    }
}
