//! Customer-facing order notifications.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use storefront_parties::Customer;

use crate::subscriber::{Notification, NotificationError, Subscriber};

/// Append-only notification log plus a live console stream.
///
/// Every line goes to both. The file is opened in append mode and never
/// truncated.
pub struct NotificationLog {
    path: PathBuf,
    file: Mutex<File>,
    console: Mutex<Box<dyn Write + Send>>,
}

impl core::fmt::Debug for NotificationLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl NotificationLog {
    /// Open (or create) the log at `path`, echoing lines to stdout.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NotificationError> {
        Self::with_console(path, Box::new(std::io::stdout()))
    }

    /// Open the log with an explicit console sink.
    pub fn with_console(
        path: impl AsRef<Path>,
        console: Box<dyn Write + Send>,
    ) -> Result<Self, NotificationError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            console: Mutex::new(console),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line to the file and echo it to the console.
    pub fn append(&self, line: &str) -> Result<(), NotificationError> {
        {
            let mut file = self.file.lock().map_err(|_| NotificationError::Poisoned)?;
            writeln!(file, "{line}")?;
            file.flush()?;
        }
        let mut console = self.console.lock().map_err(|_| NotificationError::Poisoned)?;
        writeln!(console, "{line}")?;
        Ok(())
    }
}

/// Subscriber that reports order notifications for one customer.
#[derive(Debug)]
pub struct CustomerNotifier {
    customer_name: String,
    customer_email: String,
    log: std::sync::Arc<NotificationLog>,
}

impl CustomerNotifier {
    pub fn new(customer: &Customer, log: std::sync::Arc<NotificationLog>) -> Self {
        Self {
            customer_name: customer.name().to_string(),
            customer_email: customer.email().to_string(),
            log,
        }
    }

    /// `[YYYY-mm-dd HH:MM:SS] Order Notification for <name> (<email>): <message>`
    pub fn format_line(&self, at: DateTime<Local>, message: &str) -> String {
        format!(
            "[{}] Order Notification for {} ({}): {}",
            at.format("%Y-%m-%d %H:%M:%S"),
            self.customer_name,
            self.customer_email,
            message
        )
    }
}

impl Subscriber for CustomerNotifier {
    fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let line = self.format_line(notification.occurred_at.with_timezone(&Local), &notification.message);
        tracing::info!(customer = %self.customer_email, topic = %notification.topic, "{line}");
        self.log.append(&line)
    }

    fn label(&self) -> String {
        format!("customer:{}", self.customer_email)
    }
}
