use core::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::money::line_total;
use storefront_core::{CustomerId, DomainError, DomainResult, Entity, Money, OrderId, ProductId, ValueObject};
use storefront_products::CatalogEntry;
use storefront_shipping::{ShippingMethod, ShippingStrategy};

/// Order status.
///
/// No transition graph is enforced: administrators may move an order from any
/// status to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(OrderStatus::Created),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status: {other}"))),
        }
    }
}

/// Order line: product reference, quantity, unit price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    unit_price: Money,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        })
    }

    /// Capture the entry's current price for `quantity` units.
    pub fn capture(entry: &CatalogEntry, quantity: u32) -> DomainResult<Self> {
        Self::new(entry.id_typed().clone(), entry.name(), quantity, entry.price())
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn total_price(&self) -> Money {
        line_total(self.unit_price, self.quantity)
    }
}

impl ValueObject for OrderItem {}

/// Customer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    items: Vec<OrderItem>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    shipping_address: String,
    shipping_method: Option<ShippingMethod>,
    shipping_cost: Money,
}

impl Order {
    /// A fresh order in `Created` with no items and zero shipping cost.
    pub fn new(
        id: OrderId,
        customer_id: CustomerId,
        shipping_address: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            items: Vec::new(),
            status: OrderStatus::Created,
            created_at,
            shipping_address: shipping_address.into(),
            shipping_method: None,
            shipping_cost: Decimal::ZERO,
        }
    }

    pub fn id_typed(&self) -> &OrderId {
        &self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    pub fn shipping_method(&self) -> Option<ShippingMethod> {
        self.shipping_method
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    /// Estimated delivery days of the selected method, if any.
    pub fn estimated_days(&self) -> Option<u32> {
        self.shipping_method.map(|m| m.strategy().estimated_days())
    }

    /// Σ item totals.
    pub fn total_items_price(&self) -> Money {
        self.items.iter().map(OrderItem::total_price).sum()
    }

    /// Items total plus shipping.
    pub fn total_price(&self) -> Money {
        self.total_items_price() + self.shipping_cost
    }

    /// Append an item for `quantity` units of `entry`, capturing its price.
    ///
    /// Checked against the entry as given (the caller's snapshot), not against
    /// live inventory. Fails with `Validation` for a zero quantity and with
    /// `InvariantViolation` when the entry is out of stock or short.
    pub fn add_item(&mut self, entry: &CatalogEntry, quantity: u32) -> DomainResult<()> {
        let item = OrderItem::capture(entry, quantity)?;
        if !entry.can_fulfil(quantity) {
            return Err(DomainError::invariant(format!(
                "insufficient stock for product {} (requested {}, available {})",
                entry.id_typed(),
                quantity,
                entry.stock_quantity()
            )));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn set_shipping_strategy(&mut self, strategy: &dyn ShippingStrategy) {
        self.shipping_method = Some(strategy.method());
    }

    /// Recompute the shipping cost from the selected strategy.
    pub fn calculate_shipping_cost(&mut self) -> DomainResult<Money> {
        let method = self
            .shipping_method
            .ok_or_else(|| DomainError::invariant("shipping strategy not set"))?;
        self.shipping_cost = method.strategy().cost();
        Ok(self.shipping_cost)
    }

    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Persisted line of an order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

/// Persisted shape of an order inside the `orders` collection.
///
/// Money is stored as decimal strings, status as its lowercase name and the
/// creation time as RFC 3339 under `date`. Older records carry a local time
/// without offset; those are read as local time. The trailing fields were
/// added later and default to empty for older records. Fields this type does
/// not know are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub shipping_cost: Decimal,
    pub status: OrderStatus,
    #[serde(rename = "date", deserialize_with = "order_date::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<ShippingMethod>,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub items: Vec<OrderItemRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

mod order_date {
    use super::*;
    use serde::de::{Deserializer, Error};

    /// RFC 3339, or a naive ISO-8601 timestamp taken as local time.
    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Some(at.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;
        // A local time skipped by a DST jump has no mapping; fall back to UTC.
        Some(
            Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|at| at.with_timezone(&Utc))
                .unwrap_or_else(|| naive.and_utc()),
        )
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid order date: {raw}")))
    }
}

impl From<&OrderItem> for OrderItemRecord {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            total_price: order.total_price(),
            shipping_cost: order.shipping_cost,
            status: order.status,
            created_at: order.created_at,
            shipping_method: order.shipping_method,
            shipping_address: order.shipping_address.clone(),
            items: order.items.iter().map(OrderItemRecord::from).collect(),
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use storefront_shipping::{resolve, FastShipping};

    fn entry(price: Decimal, stock: u32) -> CatalogEntry {
        CatalogEntry::with_id(
            ProductId::parse("p-1").unwrap(),
            "Widget",
            "",
            price,
            "tools",
            stock,
        )
        .unwrap()
    }

    fn order() -> Order {
        Order::new(
            OrderId::new(),
            CustomerId::parse("c-1").unwrap(),
            "1 Main St",
            Utc::now(),
        )
    }

    #[test]
    fn new_order_is_created_and_empty() {
        let order = order();
        assert_eq!(order.status(), OrderStatus::Created);
        assert!(order.items().is_empty());
        assert_eq!(order.shipping_cost(), Decimal::ZERO);
        assert_eq!(order.total_price(), Decimal::ZERO);
    }

    #[test]
    fn add_item_captures_price_and_preserves_order() {
        let mut order = order();
        order.add_item(&entry(dec!(20.00), 3), 2).unwrap();
        order.add_item(&entry(dec!(1.50), 10), 4).unwrap();

        assert_eq!(order.items().len(), 2);
        assert_eq!(order.items()[0].unit_price(), dec!(20.00));
        assert_eq!(order.items()[1].quantity(), 4);
        assert_eq!(order.total_items_price(), dec!(46.00));
    }

    #[test]
    fn add_item_rejects_short_or_empty_stock() {
        let mut order = order();
        let err = order.add_item(&entry(dec!(5), 1), 5).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let err = order.add_item(&entry(dec!(5), 0), 1).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(order.items().is_empty());
    }

    #[test]
    fn add_item_rejects_zero_quantity() {
        let mut order = order();
        let err = order.add_item(&entry(dec!(5), 1), 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn shipping_cost_requires_a_strategy() {
        let mut order = order();
        assert!(order.calculate_shipping_cost().is_err());

        order.set_shipping_strategy(&FastShipping);
        assert_eq!(order.calculate_shipping_cost().unwrap(), dec!(50.00));
        assert_eq!(order.estimated_days(), Some(2));
    }

    #[test]
    fn grand_total_adds_shipping() {
        let mut order = order();
        order.add_item(&entry(dec!(20.00), 3), 2).unwrap();
        order.set_shipping_strategy(resolve("fast").unwrap());
        order.calculate_shipping_cost().unwrap();
        assert_eq!(order.total_price(), dec!(90.00));
    }

    #[test]
    fn status_moves_freely() {
        let mut order = order();
        order.update_status(OrderStatus::Delivered);
        order.update_status(OrderStatus::Created);
        assert_eq!(order.status(), OrderStatus::Created);
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn record_round_trip_preserves_key_fields() {
        let mut order = order();
        order.add_item(&entry(dec!(20.00), 3), 2).unwrap();
        order.set_shipping_strategy(&FastShipping);
        order.calculate_shipping_cost().unwrap();
        order.update_status(OrderStatus::Shipped);

        let record = OrderRecord::from(&order);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["total_price"], "90.00");
        assert_eq!(json["shipping_cost"], "50.00");
        assert_eq!(json["status"], "shipped");
        assert!(json["date"].is_string());

        let back: OrderRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(&back.id, order.id_typed());
        assert_eq!(&back.customer_id, order.customer_id());
    }

    #[test]
    fn minimal_legacy_record_loads() {
        let json = serde_json::json!({
            "id": "o-1",
            "customer_id": "c-1",
            "total_price": "15.00",
            "shipping_cost": "10.00",
            "status": "created",
            "date": "2024-05-01T10:00:00.123456"
        });
        let record: OrderRecord = serde_json::from_value(json).unwrap();
        assert!(record.items.is_empty());
        assert_eq!(record.shipping_method, None);
        assert_eq!(record.total_price, dec!(15.00));

        let local = record.created_at.with_timezone(&Local).naive_local();
        assert_eq!(local.to_string(), "2024-05-01 10:00:00.123456");
    }

    #[test]
    fn order_dates_accept_offsets_and_reject_garbage() {
        let utc = order_date::parse("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        let shifted = order_date::parse("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(shifted, utc);
        assert!(order_date::parse("2024-05-01 10:00:00").is_some());
        assert!(order_date::parse("yesterday").is_none());

        let bad = serde_json::json!({
            "id": "o-1", "customer_id": "c-1", "total_price": "1", "shipping_cost": "0",
            "status": "created", "date": "yesterday"
        });
        assert!(serde_json::from_value::<OrderRecord>(bad).is_err());
    }

    #[test]
    fn unknown_fields_survive_a_rewrite() {
        let json = serde_json::json!({
            "id": "o-1",
            "customer_id": "c-1",
            "total_price": "15.00",
            "shipping_cost": "10.00",
            "status": "created",
            "date": "2024-05-01T10:00:00+00:00",
            "gift_note": "happy birthday"
        });
        let record: OrderRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.extra["gift_note"], "happy birthday");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["gift_note"], "happy birthday");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: items total is Σ(unit price × quantity) of accepted lines.
            #[test]
            fn items_total_is_sum_of_lines(
                lines in proptest::collection::vec((1i64..100_000, 1u32..50), 0..8)
            ) {
                let mut order = order();
                let mut expected = Decimal::ZERO;
                for (cents, qty) in &lines {
                    let price = Decimal::new(*cents, 2);
                    order.add_item(&entry(price, *qty), *qty).unwrap();
                    expected += price * Decimal::from(*qty);
                }
                prop_assert_eq!(order.total_items_price(), expected);
                prop_assert_eq!(order.items().len(), lines.len());
            }
        }
    }
}
