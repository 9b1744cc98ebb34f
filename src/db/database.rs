//! The immutable, versioned database value: a graph plus its ancestor
//! chain.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::graph::Graph;
use crate::value::UtcInstant;

/// One point in a connection's history: a graph value, the timestamp it was
/// committed at, its transaction number, and the chain of every database
/// that preceded it (oldest to newest, `self` not included).
///
/// `history.len() == t` always: the initial (empty) database has `t == 0`
/// and an empty history; each commit appends the pre-commit database to
/// the new value's history and increments `t` by one.
#[derive(Debug, Clone)]
pub struct Database {
    pub graph: Graph,
    pub(crate) history: Arc<Vec<Database>>,
    pub timestamp: UtcInstant,
    pub t: u64,
}

/// The position argument to [`Database::as_of`].
#[derive(Debug, Clone)]
pub enum AsOf {
    /// A transaction number: `history[clamp(t, 0, history.len()-1)]`, or
    /// `self` if `t >= history.len()`. Negative `t` clamps to the oldest
    /// entry in history (or `self` if there is no history yet).
    T(i64),
    /// An instant: the greatest historical database whose timestamp is
    /// `<= instant`, or `self` if `instant >= self.timestamp`.
    Instant(UtcInstant),
}

impl Database {
    pub fn empty(graph: Graph) -> Self {
        Self {
            graph,
            history: Arc::new(Vec::new()),
            timestamp: UtcInstant(OffsetDateTime::now_utc()),
            t: 0,
        }
    }

    /// Every database that ever existed on this timeline, oldest to
    /// newest, `self` included as the last element.
    pub fn full_history(&self) -> Vec<&Database> {
        let mut out: Vec<&Database> = self.history.iter().collect();
        out.push(self);
        out
    }

    pub fn as_of(&self, pos: AsOf) -> Database {
        match pos {
            AsOf::T(t) => {
                if t < 0 {
                    self.history.first().cloned().unwrap_or_else(|| self.clone())
                } else if self.history.is_empty() || t as usize >= self.history.len() {
                    self.clone()
                } else {
                    self.history[t as usize].clone()
                }
            }
            AsOf::Instant(instant) => {
                let target = instant.0.unix_timestamp_nanos();
                if target >= self.timestamp.0.unix_timestamp_nanos() {
                    return self.clone();
                }
                let idx = self
                    .history
                    .partition_point(|db| db.timestamp.0.unix_timestamp_nanos() <= target);
                if idx == 0 {
                    self.history
                        .first()
                        .cloned()
                        .unwrap_or_else(|| self.clone())
                } else {
                    self.history[idx - 1].clone()
                }
            }
        }
    }

    /// The first database, across this timeline's full history, strictly
    /// newer than `instant`. `None` if `instant` is at or after `self`'s
    /// timestamp.
    pub fn since(&self, instant: &UtcInstant) -> Option<Database> {
        let target = instant.0.unix_timestamp_nanos();
        self.full_history()
            .into_iter()
            .find(|db| db.timestamp.0.unix_timestamp_nanos() > target)
            .cloned()
    }
}
