//! The versioned connection model: immutable [`Database`] snapshots, a
//! mutable [`Connection`] cell that threads transactions through them, the
//! process-wide [`ConnectionRegistry`], and ambient [`Config`].

mod config;
mod connection;
mod database;
mod registry;

pub use config::Config;
pub use connection::{Connection, TransactionResult};
pub use database::{AsOf, Database};
pub use registry::{ConnectionKind, ConnectionRegistry};
