//! Tracing/logging setup shared by binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, LoggingConfig};

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(LoggingConfig::from_env());
}
