//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{GraphError, Result};

/// Initializes the global `tracing` subscriber at the given filter
/// directive (e.g. `"info"`, `"tripledb=debug"`). Idempotent in the sense
/// that a second call fails cleanly rather than panicking.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| GraphError::UnsupportedOperation(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| GraphError::UnsupportedOperation("logging already initialized".into()))
}
