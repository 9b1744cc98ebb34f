//! The connection registry and its thin URI router: `sys:<kind>://<name>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::db::connection::Connection;
use crate::db::database::Database;
use crate::error::{acquire_lock, GraphError, Result};
use crate::graph::{Graph, GraphFlavor};

const URI_PREFIX: &str = "sys:";

/// The connection kind named in a registry URI's scheme component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    SimpleGraph,
    MultiGraph,
    /// Recognized but not implemented by this crate: the durable on-disk
    /// store is out of scope, so constructing one fails fast with
    /// [`GraphError::UnsupportedFeature`].
    Durable,
}

impl ConnectionKind {
    fn parse(scheme: &str) -> Result<Self> {
        match scheme {
            "simple-graph" | "mem-like" => Ok(ConnectionKind::SimpleGraph),
            "multi-graph" | "multi-like" => Ok(ConnectionKind::MultiGraph),
            "durable" => Ok(ConnectionKind::Durable),
            other => Err(GraphError::UnknownUriScheme(other.to_string())),
        }
    }
}

/// Parses `sys:<kind>://<name>` into its kind and name parts.
fn parse_uri(uri: &str) -> Result<(ConnectionKind, String)> {
    let rest = uri
        .strip_prefix(URI_PREFIX)
        .ok_or_else(|| GraphError::UnknownUriScheme(uri.to_string()))?;
    let (scheme, name) = rest
        .split_once("://")
        .ok_or_else(|| GraphError::UnknownUriScheme(uri.to_string()))?;
    let kind = ConnectionKind::parse(scheme)?;
    Ok((kind, name.to_string()))
}

fn new_connection(kind: ConnectionKind, tx_timeout_msec: u64) -> Result<Connection> {
    let flavor = match kind {
        ConnectionKind::SimpleGraph => GraphFlavor::Simple,
        ConnectionKind::MultiGraph => GraphFlavor::Multi,
        ConnectionKind::Durable => {
            return Err(GraphError::UnsupportedFeature(
                "durable graphs are not implemented by this crate",
            ))
        }
    };
    Ok(Connection::new(Database::empty(Graph::new(flavor)), tx_timeout_msec))
}

/// Maps registry URIs to live [`Connection`] values: `create` inserts
/// fresh, `connect` returns-or-creates, `release` removes, `delete` empties
/// a connection's history in place.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<Mutex<HashMap<String, Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh, empty connection of the kind named in `uri`. Returns
    /// the existing connection unchanged if `uri` is already registered.
    pub fn create(&self, uri: &str, tx_timeout_msec: u64) -> Result<Connection> {
        let (kind, name) = parse_uri(uri)?;
        let mut guard = acquire_lock(&self.connections)?;
        if let Some(existing) = guard.get(&name) {
            return Ok(existing.clone());
        }
        let conn = new_connection(kind, tx_timeout_msec)?;
        guard.insert(name.clone(), conn.clone());
        info!(uri, "connection created");
        Ok(conn)
    }

    /// Returns the existing connection for `uri`, or creates a simple-graph
    /// one if absent.
    pub fn connect(&self, uri: &str, tx_timeout_msec: u64) -> Result<Connection> {
        let (_, name) = parse_uri(uri)?;
        {
            let guard = acquire_lock(&self.connections)?;
            if let Some(existing) = guard.get(&name) {
                return Ok(existing.clone());
            }
        }
        let mut guard = acquire_lock(&self.connections)?;
        if let Some(existing) = guard.get(&name) {
            return Ok(existing.clone());
        }
        let conn = new_connection(ConnectionKind::SimpleGraph, tx_timeout_msec)?;
        guard.insert(name, conn.clone());
        Ok(conn)
    }

    /// Removes `uri`'s connection from the registry. The connection handle
    /// itself is `Arc`-backed, so existing clones held by callers remain
    /// valid until dropped; this only stops the registry from serving it to
    /// future `connect`/`create` calls.
    pub fn release(&self, uri: &str) -> Result<()> {
        let (_, name) = parse_uri(uri)?;
        let mut guard = acquire_lock(&self.connections)?;
        guard.remove(&name);
        info!(uri, "connection released");
        Ok(())
    }

    /// Empties `uri`'s connection's history and resets its timestamp,
    /// keeping the current graph.
    pub fn delete(&self, uri: &str) -> Result<()> {
        let (_, name) = parse_uri(uri)?;
        let guard = acquire_lock(&self.connections)?;
        match guard.get(&name) {
            Some(conn) => conn.reset(),
            None => Err(GraphError::DatabaseClosed),
        }
    }

    /// Releases every registered connection. Intended as a process-wide
    /// shutdown hook.
    pub fn shutdown(&self) -> Result<()> {
        let mut guard = acquire_lock(&self.connections)?;
        let count = guard.len();
        guard.clear();
        warn!(count, "connection registry shut down, all connections released");
        Ok(())
    }
}
