//! Order creation pipeline.
//!
//! ```text
//! customer + lines + shipping method
//!   ↓
//! 1. Fresh order (Created, no items)
//!   ↓
//! 2. Validate each line against the caller's catalog snapshot, capture prices
//!   ↓
//! 3. Resolve shipping strategy, attach cost
//!   ↓
//! 4. Reserve stock for every line (all-or-nothing)
//!   ↓
//! 5. Notify the customer on `order_status`
//!   ↓
//! 6. Append to the customer's history, return the order
//! ```
//!
//! Steps 1-3 mutate nothing outside the new order. A failure in step 4 leaves
//! inventory untouched. Notification failures are logged and never fail the
//! order.
//!
//! Callers that must persist the order before it becomes visible split the
//! pipeline: [`OrderFactory::prepare_order`] runs steps 1-4, the caller stores
//! the order, then [`OrderFactory::confirm_order`] runs steps 5-6. If storing
//! fails, [`OrderFactory::cancel_reservation`] gives the stock back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;

use storefront_core::{CustomerId, DomainError, OrderId, ProductId};
use storefront_notifications::{
    CustomerNotifier, NotificationHub, NotificationLog, Subscriber, ORDER_STATUS_TOPIC,
};
use storefront_parties::Customer;
use storefront_products::CatalogEntry;
use storefront_sales::Order;
use storefront_shipping::resolve;

use crate::document_store::DocumentStore;
use crate::inventory_manager::{InventoryError, InventoryManager};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock for product {product_id} (requested {requested}, available {available})")]
    InsufficientStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    #[error("unknown product: {0}")]
    UnknownProduct(String),

    #[error("shipping method `{method}` rejected: {reason}")]
    Shipping { method: String, reason: String },

    #[error(transparent)]
    Inventory(InventoryError),
}

impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
            } => OrderError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            InventoryError::NotFound(id) => OrderError::UnknownProduct(id),
            other => OrderError::Inventory(other),
        }
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        OrderError::Validation(err.to_string())
    }
}

/// Builds the subscriber that reports order events to one customer.
pub type NotifierFactory = Box<dyn Fn(&Customer) -> Arc<dyn Subscriber> + Send + Sync>;

pub struct OrderFactory<S> {
    inventory: Arc<InventoryManager<S>>,
    hub: Arc<NotificationHub>,
    make_notifier: NotifierFactory,
    // One notifier per customer, subscribed once.
    notifiers: Mutex<HashMap<CustomerId, Arc<dyn Subscriber>>>,
}

impl<S> core::fmt::Debug for OrderFactory<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderFactory").finish_non_exhaustive()
    }
}

impl<S> OrderFactory<S>
where
    S: DocumentStore,
{
    pub fn new(
        inventory: Arc<InventoryManager<S>>,
        hub: Arc<NotificationHub>,
        make_notifier: NotifierFactory,
    ) -> Self {
        Self {
            inventory,
            hub,
            make_notifier,
            notifiers: Mutex::new(HashMap::new()),
        }
    }

    /// Factory whose customer notifiers write to `log`.
    pub fn with_log(
        inventory: Arc<InventoryManager<S>>,
        hub: Arc<NotificationHub>,
        log: Arc<NotificationLog>,
    ) -> Self {
        Self::new(
            inventory,
            hub,
            Box::new(move |customer: &Customer| -> Arc<dyn Subscriber> {
                Arc::new(CustomerNotifier::new(customer, log.clone()))
            }),
        )
    }

    pub fn inventory(&self) -> &Arc<InventoryManager<S>> {
        &self.inventory
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    /// Create an order for `customer` from `(entry, quantity)` lines.
    ///
    /// Lines are checked against the entries as given; the stock reservation
    /// then re-checks live inventory atomically. An empty line list produces
    /// an order with only a shipping charge.
    pub fn create_order(
        &self,
        customer: &mut Customer,
        lines: &[(CatalogEntry, u32)],
        shipping_method: &str,
        shipping_address: &str,
    ) -> Result<Order, OrderError> {
        let order = self.prepare_order(customer, lines, shipping_method, shipping_address)?;
        self.confirm_order(customer, &order);
        Ok(order)
    }

    /// Build the order and reserve its stock, without notifying anyone or
    /// touching the customer's history.
    pub fn prepare_order(
        &self,
        customer: &Customer,
        lines: &[(CatalogEntry, u32)],
        shipping_method: &str,
        shipping_address: &str,
    ) -> Result<Order, OrderError> {
        self.build(customer, lines, shipping_method, shipping_address)
            .inspect_err(|err| {
                tracing::warn!(customer_id = %customer.id_typed(), error = %err, "order rejected");
            })
    }

    /// Notify the customer and append a prepared order to their history.
    pub fn confirm_order(&self, customer: &mut Customer, order: &Order) {
        self.notify(customer, order);
        customer.add_order(order.clone());

        tracing::info!(
            order_id = %order.id_typed(),
            customer_id = %customer.id_typed(),
            items = order.items().len(),
            total = %order.total_price(),
            "order created"
        );
    }

    /// Return the stock reserved by a prepared order that will not be confirmed.
    pub fn cancel_reservation(&self, order: &Order) -> Result<(), InventoryError> {
        self.inventory.release(&reservation_lines(order))?;
        tracing::info!(order_id = %order.id_typed(), "order reservation released");
        Ok(())
    }

    fn build(
        &self,
        customer: &Customer,
        lines: &[(CatalogEntry, u32)],
        shipping_method: &str,
        shipping_address: &str,
    ) -> Result<Order, OrderError> {
        let mut order = Order::new(
            OrderId::new(),
            customer.id_typed().clone(),
            shipping_address,
            Utc::now(),
        );

        for (entry, quantity) in lines {
            if *quantity == 0 {
                return Err(OrderError::Validation(format!(
                    "quantity for product {} must be positive",
                    entry.id_typed()
                )));
            }
            if !entry.can_fulfil(*quantity) {
                return Err(OrderError::InsufficientStock {
                    product_id: entry.id_typed().clone(),
                    requested: u64::from(*quantity),
                    available: entry.stock_quantity(),
                });
            }
            order.add_item(entry, *quantity)?;
        }

        let strategy = resolve(shipping_method).map_err(|err| OrderError::Shipping {
            method: shipping_method.to_string(),
            reason: err.to_string(),
        })?;
        order.set_shipping_strategy(strategy);
        order.calculate_shipping_cost()?;

        self.inventory.reserve(&reservation_lines(&order))?;

        Ok(order)
    }

    fn notify(&self, customer: &Customer, order: &Order) {
        let notifier = match self.notifiers.lock() {
            Ok(mut notifiers) => notifiers
                .entry(customer.id_typed().clone())
                .or_insert_with(|| (self.make_notifier)(customer))
                .clone(),
            // Registry poisoned: notify through a one-off subscriber.
            Err(_) => (self.make_notifier)(customer),
        };

        if let Err(err) = self.hub.subscribe_once(ORDER_STATUS_TOPIC, notifier) {
            tracing::warn!(customer_id = %customer.id_typed(), error = %err, "customer notifier not subscribed");
        }

        let report = self.hub.publish(
            ORDER_STATUS_TOPIC,
            format!("Order {} has been created successfully", order.id_typed()),
        );
        if !report.is_clean() {
            tracing::warn!(
                order_id = %order.id_typed(),
                failed = report.failures.len(),
                "order notification partially delivered"
            );
        }
    }
}

fn reservation_lines(order: &Order) -> Vec<(ProductId, u32)> {
    order
        .items()
        .iter()
        .map(|item| (item.product_id().clone(), item.quantity()))
        .collect()
}
