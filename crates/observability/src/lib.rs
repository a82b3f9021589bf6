//! Process-wide tracing setup shared by every storefront binary and test.

pub mod tracing;

pub use crate::tracing::{LogFormat, UnknownLogFormat};

/// Initialize tracing with JSON output.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init_with(LogFormat::Json);
}
