//! The versioned connection: a mutable cell over an otherwise-immutable
//! timeline of [`Database`] values, serializing writers via compare-and-set.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::db::database::{AsOf, Database};
use crate::error::{acquire_lock, GraphError, Result};
use crate::graph::Graph;
use crate::triple::Triple;
use crate::value::UtcInstant;

/// The result of a successful [`Connection::transact`]: the database
/// immediately before and after the transaction, plus the triples it
/// retracted and asserted, in that order (`tx-data = retracts ++
/// asserts`).
#[derive(Debug, Clone)]
pub struct TransactionResult {
    pub db_before: Database,
    pub db_after: Database,
    pub tx_data: Vec<Triple>,
}

/// A live, mutable binding to a versioned timeline of databases.
///
/// Readers clone the current `Database` (cheap: the graph and history are
/// `Arc`-backed) and never block. Writers run their update function
/// *before* touching the cell, then attempt a compare-and-set; on
/// contention they retry with the now-current database, never serializing
/// on the update function itself — only on the final swap.
#[derive(Clone)]
pub struct Connection {
    cell: Arc<Mutex<Arc<Database>>>,
    tx_timeout: Duration,
}

impl Connection {
    pub fn new(initial: Database, tx_timeout_msec: u64) -> Self {
        Self {
            cell: Arc::new(Mutex::new(Arc::new(initial))),
            tx_timeout: Duration::from_millis(tx_timeout_msec),
        }
    }

    /// A read-only snapshot of the current database. Cheap: no clone of the
    /// graph's actual index contents occurs, only `Arc` pointer bumps.
    pub fn current(&self) -> Result<Database> {
        Ok((**acquire_lock(&self.cell)?).clone())
    }

    fn current_arc(&self) -> Result<Arc<Database>> {
        Ok(acquire_lock(&self.cell)?.clone())
    }

    /// Runs the transaction protocol: captures the current database, runs
    /// `update` against its graph, and retries the compare-and-set swap if
    /// another transactor committed first.
    ///
    /// `update` receives the pre-transaction graph and the transaction
    /// number it is building, and returns `(new_graph, tx_data)` where
    /// `tx_data` is the `retracts ++ asserts` triple list to attach to the
    /// result.
    pub fn transact<F>(&self, update: F) -> Result<TransactionResult>
    where
        F: Fn(&Graph, u64) -> (Graph, Vec<Triple>),
    {
        let deadline = Instant::now() + self.tx_timeout;
        loop {
            let before_arc = self.current_arc()?;
            let db_before = (*before_arc).clone();
            let next_tx = db_before.t + 1;
            let (new_graph, tx_data) = update(&db_before.graph, next_tx);

            let mut history = (*db_before.history).clone();
            history.push(db_before.clone());
            let db_after = Database {
                graph: new_graph,
                history: Arc::new(history),
                timestamp: UtcInstant(OffsetDateTime::now_utc()),
                t: next_tx,
            };

            let mut guard = acquire_lock(&self.cell)?;
            if Arc::ptr_eq(&guard, &before_arc) {
                *guard = Arc::new(db_after.clone());
                drop(guard);
                debug!(t = next_tx, "transaction committed");
                return Ok(TransactionResult {
                    db_before,
                    db_after,
                    tx_data,
                });
            }
            drop(guard);

            if Instant::now() >= deadline {
                warn!("transaction timed out retrying compare-and-set");
                return Err(GraphError::TransactionTimeout);
            }
        }
    }

    pub fn as_of(&self, pos: AsOf) -> Result<Database> {
        Ok(self.current()?.as_of(pos))
    }

    pub fn since(&self, instant: &UtcInstant) -> Result<Option<Database>> {
        Ok(self.current()?.since(instant))
    }

    /// Empties the history and resets the timestamp, keeping the current
    /// graph.
    pub fn reset(&self) -> Result<()> {
        let mut guard = acquire_lock(&self.cell)?;
        let graph = guard.graph.clone();
        *guard = Arc::new(Database::empty(graph));
        Ok(())
    }
}
