use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The subscriber rejected or could not handle the notification.
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("notification sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sink lock poisoned by a panicking writer.
    #[error("notification sink poisoned")]
    Poisoned,
}

/// A message published on a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Receives notifications for the topics it is subscribed to.
///
/// Identity for `unsubscribe` is the `Arc` allocation, not value equality.
pub trait Subscriber: Send + Sync + core::fmt::Debug {
    fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;

    /// Short label used in delivery reports and logs.
    fn label(&self) -> String {
        "subscriber".to_string()
    }
}

impl<S> Subscriber for Arc<S>
where
    S: Subscriber + ?Sized,
{
    fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        (**self).deliver(notification)
    }

    fn label(&self) -> String {
        (**self).label()
    }
}
