use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("query is missing required clause: {0}")]
    MissingClause(&'static str),
    #[error("query has unknown clauses: {0:?}")]
    UnknownClauses(Vec<String>),
    #[error("illegal aggregate: {0}")]
    IllegalAggregate(String),
    #[error("unsupported operation in expression: {0}")]
    UnsupportedOperation(String),
    #[error("graphs are not of a compatible flavor for diff")]
    IncompatibleGraphs,
    #[error("read past end of region {region} at offset {offset}")]
    BeyondEndOfFile { region: u64, offset: u64 },
    #[error("transaction file is corrupted")]
    CorruptedTransactionFile,
    #[error("transaction did not complete within the configured timeout")]
    TransactionTimeout,
    #[error("operation attempted on a released connection")]
    DatabaseClosed,
    #[error("unknown connection uri scheme: {0}")]
    UnknownUriScheme(String),
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
    #[error("connection lock poisoned")]
    LockPoisoned,
}

/// Turns a poisoned std mutex into a typed, logged error instead of panicking.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| {
        error!("connection cell lock poisoned - fatal error");
        GraphError::LockPoisoned
    })
}
