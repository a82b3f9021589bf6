//! End-to-end tests for the order pipeline.
//!
//! Storefront → InventoryManager → OrderFactory → NotificationHub → OrderBook
//!
//! Verifies:
//! - Orders reserve stock, price correctly, notify and get recorded
//! - Rejected orders leave inventory and history untouched
//! - Everything persisted through the JSON store survives a reopen

use std::io::Write;
use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;

use storefront_core::ProductId;
use storefront_notifications::{NotificationLog, ORDER_STATUS_TOPIC};
use storefront_parties::Customer;
use storefront_products::CatalogEntry;
use storefront_sales::OrderStatus;

use crate::config::StorefrontConfig;
use crate::document_store::{DocumentStore, InMemoryDocumentStore, StoreError, ORDERS, PRODUCTS};
use crate::order_factory::OrderError;
use crate::storefront::{PlaceOrderError, Storefront};

/// Console sink that keeps what was written.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    storefront: Storefront,
    console: Captured,
    log_path: std::path::PathBuf,
}

fn in_memory() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("notifications.log");
    let console = Captured::default();
    let log = NotificationLog::with_console(&log_path, Box::new(console.clone())).unwrap();
    let storefront = Storefront::with_store(Arc::new(InMemoryDocumentStore::new()), Arc::new(log)).unwrap();
    Harness {
        _dir: dir,
        storefront,
        console,
        log_path,
    }
}

fn widget(stock: u32) -> CatalogEntry {
    CatalogEntry::with_id(ProductId::parse("p-1").unwrap(), "Widget", "A widget", dec!(20.00), "tools", stock)
        .unwrap()
}

fn register_alice(storefront: &Storefront) -> Customer {
    storefront
        .customers()
        .register("Alice", "alice@example.com", "1 Main St", "555-0100")
        .unwrap()
}

#[test]
fn placing_an_order_reserves_notifies_and_records() {
    let h = in_memory();
    h.storefront.inventory().add(widget(3)).unwrap();
    let mut alice = register_alice(&h.storefront);

    let order = h
        .storefront
        .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 2)], "fast", "1 Main St")
        .unwrap();

    assert_eq!(order.total_items_price(), dec!(40.00));
    assert_eq!(order.shipping_cost(), dec!(50.00));
    assert_eq!(order.total_price(), dec!(90.00));
    assert_eq!(h.storefront.inventory().get("p-1").unwrap().stock_quantity(), 1);
    assert_eq!(alice.order_history().len(), 1);

    let recorded = h.storefront.orders().get(order.id_typed()).unwrap().unwrap();
    assert_eq!(recorded.total_price, dec!(90.00));
    assert_eq!(recorded.status, OrderStatus::Created);
    assert_eq!(recorded.items.len(), 1);

    let expected = format!(
        "Order Notification for Alice (alice@example.com): Order {} has been created successfully",
        order.id_typed()
    );
    let log = std::fs::read_to_string(&h.log_path).unwrap();
    assert!(log.trim_end().ends_with(&expected));
    assert!(h.console.text().contains(&expected));
}

#[test]
fn insufficient_stock_is_rejected_without_side_effects() {
    let h = in_memory();
    h.storefront.inventory().add(widget(1)).unwrap();
    let mut alice = register_alice(&h.storefront);

    let err = h
        .storefront
        .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 5)], "fast", "")
        .unwrap_err();

    assert!(matches!(
        err,
        PlaceOrderError::Order(OrderError::InsufficientStock { requested: 5, available: 1, .. })
    ));
    assert_eq!(h.storefront.inventory().get("p-1").unwrap().stock_quantity(), 1);
    assert!(alice.order_history().is_empty());
    assert!(h.storefront.orders().list().unwrap().is_empty());
    assert!(std::fs::read_to_string(&h.log_path).unwrap().is_empty());
}

#[test]
fn unknown_shipping_method_is_rejected() {
    let h = in_memory();
    h.storefront.inventory().add(widget(3)).unwrap();
    let mut alice = register_alice(&h.storefront);

    let err = h
        .storefront
        .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 1)], "bike", "")
        .unwrap_err();

    assert!(matches!(err, PlaceOrderError::Order(OrderError::Shipping { .. })));
    assert_eq!(h.storefront.inventory().get("p-1").unwrap().stock_quantity(), 3);
    assert!(h.storefront.orders().list().unwrap().is_empty());
}

#[test]
fn unknown_product_is_rejected() {
    let h = in_memory();
    let mut alice = register_alice(&h.storefront);

    let err = h
        .storefront
        .place_order(&mut alice, &[(ProductId::parse("nope").unwrap(), 1)], "fast", "")
        .unwrap_err();
    assert!(matches!(err, PlaceOrderError::Order(OrderError::UnknownProduct(_))));
}

/// In-memory store whose `orders` collection cannot be written.
#[derive(Debug, Default)]
struct OrdersUnwritable(InMemoryDocumentStore);

impl DocumentStore for OrdersUnwritable {
    fn load(&self, collection: &str) -> Result<Option<serde_json::Value>, StoreError> {
        self.0.load(collection)
    }

    fn save(&self, collection: &str, document: &serde_json::Value) -> Result<(), StoreError> {
        if collection == ORDERS {
            return Err(StoreError::Io {
                collection: collection.to_string(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.0.save(collection, document)
    }
}

#[test]
fn failed_recording_releases_stock_and_stays_silent() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("notifications.log");
    let console = Captured::default();
    let log = NotificationLog::with_console(&log_path, Box::new(console.clone())).unwrap();
    let storefront = Storefront::with_store(Arc::new(OrdersUnwritable::default()), Arc::new(log)).unwrap();
    storefront.inventory().add(widget(3)).unwrap();
    let mut alice = register_alice(&storefront);

    let err = storefront
        .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 2)], "fast", "1 Main St")
        .unwrap_err();

    assert!(matches!(err, PlaceOrderError::Record { .. }));
    assert_eq!(storefront.inventory().get("p-1").unwrap().stock_quantity(), 3);
    let saved = storefront.store().load(PRODUCTS).unwrap().unwrap();
    assert_eq!(saved["p-1"]["stock_quantity"], 3);
    assert!(alice.order_history().is_empty());
    assert!(storefront.orders().list().unwrap().is_empty());
    assert_eq!(storefront.hub().subscriber_count(ORDER_STATUS_TOPIC), 0);
    assert!(std::fs::read_to_string(&log_path).unwrap_or_default().is_empty());
    assert!(console.text().is_empty());
}

#[test]
fn multi_line_order_is_all_or_nothing() {
    let h = in_memory();
    let inventory = h.storefront.inventory();
    inventory.add(widget(5)).unwrap();
    inventory
        .add(CatalogEntry::with_id(ProductId::parse("p-2").unwrap(), "Gadget", "", dec!(7.50), "tools", 1).unwrap())
        .unwrap();
    let mut alice = register_alice(&h.storefront);

    let lines = [
        (ProductId::parse("p-1").unwrap(), 2),
        (ProductId::parse("p-2").unwrap(), 2),
    ];
    assert!(h.storefront.place_order(&mut alice, &lines, "economic", "").is_err());
    assert_eq!(inventory.get("p-1").unwrap().stock_quantity(), 5);
    assert_eq!(inventory.get("p-2").unwrap().stock_quantity(), 1);

    let lines = [
        (ProductId::parse("p-1").unwrap(), 2),
        (ProductId::parse("p-2").unwrap(), 1),
    ];
    let order = h.storefront.place_order(&mut alice, &lines, "economic", "").unwrap();
    assert_eq!(order.total_price(), dec!(57.50));
    assert_eq!(inventory.get("p-1").unwrap().stock_quantity(), 3);
    assert_eq!(inventory.get("p-2").unwrap().stock_quantity(), 0);
}

#[test]
fn repeat_customers_are_notified_once_per_order() {
    let h = in_memory();
    h.storefront.inventory().add(widget(10)).unwrap();
    let mut alice = register_alice(&h.storefront);

    for _ in 0..3 {
        h.storefront
            .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 1)], "drone", "")
            .unwrap();
    }

    let log = std::fs::read_to_string(&h.log_path).unwrap();
    assert_eq!(log.lines().count(), 3);
    assert_eq!(h.storefront.orders().for_customer(alice.id_typed()).unwrap().len(), 3);
}

#[test]
fn status_updates_are_persisted() {
    let h = in_memory();
    h.storefront.inventory().add(widget(1)).unwrap();
    let mut alice = register_alice(&h.storefront);
    let order = h
        .storefront
        .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 1)], "fast", "")
        .unwrap();

    h.storefront
        .update_order_status(order.id_typed(), OrderStatus::Shipped)
        .unwrap();
    let saved = h.storefront.store().load(ORDERS).unwrap().unwrap();
    assert_eq!(saved[0]["status"], "shipped");
}

#[test]
fn state_survives_reopening_the_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorefrontConfig {
        data_dir: dir.path().join("data"),
        notification_log: dir.path().join("logs").join("notifications.log"),
        ..StorefrontConfig::default()
    };

    let order_id = {
        let storefront = Storefront::open(&config).unwrap();
        storefront.inventory().add(widget(3)).unwrap();
        let mut alice = register_alice(&storefront);
        storefront
            .place_order(&mut alice, &[(ProductId::parse("p-1").unwrap(), 2)], "fast", "1 Main St")
            .unwrap()
            .id_typed()
            .clone()
    };

    let raw = std::fs::read_to_string(config.data_dir.join(format!("{PRODUCTS}.json"))).unwrap();
    assert!(raw.contains("\"price\": \"20.00\""));

    let reopened = Storefront::open(&config).unwrap();
    assert_eq!(reopened.inventory().get("p-1").unwrap().stock_quantity(), 1);

    let record = reopened.orders().get(&order_id).unwrap().unwrap();
    assert_eq!(record.total_price, dec!(90.00));
    assert_eq!(record.shipping_address, "1 Main St");

    let customers = reopened.customers().search("alice").unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].email(), "alice@example.com");
}
