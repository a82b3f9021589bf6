//! Topic-keyed notification hub.
//!
//! Unlike the broadcast channels used for event distribution elsewhere, the
//! hub delivers synchronously: `publish` returns only after every subscriber
//! of the topic has been called, in subscription order.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::subscriber::{Notification, NotificationError, Subscriber};

/// Topic used for order lifecycle messages.
pub const ORDER_STATUS_TOPIC: &str = "order_status";

/// One failed delivery inside a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Position of the subscriber in the topic's list at publish time.
    pub position: usize,
    pub subscriber: String,
    pub error: String,
}

/// Outcome of a publish: how many subscribers received the message and which
/// ones failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Publish/subscribe registry: topic → ordered subscribers.
///
/// Construct one per process and share it by `Arc`.
#[derive(Debug, Default)]
pub struct NotificationHub {
    topics: RwLock<HashMap<String, Vec<Arc<dyn Subscriber>>>>,
}

fn same_subscriber(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    // Compare data addresses only; vtable pointers may differ across codegen units.
    core::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `subscriber` to the topic. Duplicates are kept and each receives
    /// its own delivery.
    pub fn subscribe(&self, topic: &str, subscriber: Arc<dyn Subscriber>) -> Result<(), NotificationError> {
        let mut topics = self.topics.write().map_err(|_| NotificationError::Poisoned)?;
        topics.entry(topic.to_string()).or_default().push(subscriber);
        Ok(())
    }

    /// Append `subscriber` unless the topic already holds it (by identity).
    ///
    /// Check and insert happen under one write lock. Returns whether the
    /// subscriber was added.
    pub fn subscribe_once(&self, topic: &str, subscriber: Arc<dyn Subscriber>) -> Result<bool, NotificationError> {
        let mut topics = self.topics.write().map_err(|_| NotificationError::Poisoned)?;
        let subs = topics.entry(topic.to_string()).or_default();
        if subs.iter().any(|s| same_subscriber(s, &subscriber)) {
            return Ok(false);
        }
        subs.push(subscriber);
        Ok(true)
    }

    /// Remove every registration of `subscriber` (by identity) from the topic.
    ///
    /// Returns how many registrations were removed.
    pub fn unsubscribe(&self, topic: &str, subscriber: &Arc<dyn Subscriber>) -> usize {
        let Ok(mut topics) = self.topics.write() else {
            return 0;
        };
        let Some(subs) = topics.get_mut(topic) else {
            return 0;
        };

        let before = subs.len();
        subs.retain(|s| !same_subscriber(s, subscriber));
        let removed = before - subs.len();

        if subs.is_empty() {
            topics.remove(topic);
        }
        removed
    }

    pub fn is_subscribed(&self, topic: &str, subscriber: &Arc<dyn Subscriber>) -> bool {
        self.topics
            .read()
            .map(|topics| {
                topics
                    .get(topic)
                    .is_some_and(|subs| subs.iter().any(|s| same_subscriber(s, subscriber)))
            })
            .unwrap_or(false)
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .map(|topics| topics.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Deliver `message` to every current subscriber of `topic`, in order.
    ///
    /// The subscriber list is snapshotted before delivery, so subscribers may
    /// call back into the hub. Failures are collected in the report and logged.
    pub fn publish(&self, topic: &str, message: impl Into<String>) -> DeliveryReport {
        let subscribers: Vec<Arc<dyn Subscriber>> = match self.topics.read() {
            Ok(topics) => topics.get(topic).cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        let mut report = DeliveryReport::default();
        if subscribers.is_empty() {
            return report;
        }

        let notification = Notification::new(topic, message);
        for (position, subscriber) in subscribers.iter().enumerate() {
            match subscriber.deliver(&notification) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    let label = subscriber.label();
                    tracing::warn!(topic, subscriber = %label, error = %err, "notification delivery failed");
                    report.failures.push(DeliveryFailure {
                        position,
                        subscriber: label,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::debug!(topic, delivered = report.delivered, failed = report.failures.len(), "notification published");
        report
    }
}
