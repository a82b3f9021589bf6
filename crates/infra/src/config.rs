//! Runtime configuration, read from the environment.

use std::path::PathBuf;

use anyhow::Context;

use storefront_observability::LogFormat;

pub const DATA_DIR_VAR: &str = "STOREFRONT_DATA_DIR";
pub const NOTIFICATION_LOG_VAR: &str = "STOREFRONT_NOTIFICATION_LOG";
pub const LOG_FORMAT_VAR: &str = "STOREFRONT_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Directory holding `<collection>.json` files.
    pub data_dir: PathBuf,
    /// Append-only customer notification log.
    pub notification_log: PathBuf,
    pub log_format: LogFormat,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            notification_log: PathBuf::from("notifications.log"),
            log_format: LogFormat::Json,
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_VAR).map(PathBuf::from).unwrap_or_else(|| {
            tracing::warn!(
                default = %defaults.data_dir.display(),
                "{DATA_DIR_VAR} not set; using default data directory"
            );
            defaults.data_dir.clone()
        });

        let notification_log = lookup(NOTIFICATION_LOG_VAR)
            .map(PathBuf::from)
            .unwrap_or(defaults.notification_log);

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?,
            None => defaults.log_format,
        };

        Ok(Self {
            data_dir,
            notification_log,
            log_format,
        })
    }
}
