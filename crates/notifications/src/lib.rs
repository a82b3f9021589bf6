//! Notifications: topic-keyed publish/subscribe.
//!
//! Delivery is synchronous and ordered. Each subscriber is delivered to
//! independently; one failing subscriber never prevents delivery to the rest.

pub mod customer_notifier;
pub mod hub;
pub mod subscriber;

pub use customer_notifier::{CustomerNotifier, NotificationLog};
pub use hub::{DeliveryFailure, DeliveryReport, NotificationHub, ORDER_STATUS_TOPIC};
pub use subscriber::{Notification, NotificationError, Subscriber};
