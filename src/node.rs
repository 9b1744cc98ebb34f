//! Opaque node identity allocation.
//!
//! A [`Node`] has no internal structure beyond identity: two distinct
//! allocations are never equal, and equality is exactly allocation identity.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reserved identifier meaning "no node" (mirrors `NULL_NODE_ID` in
/// property-graph engines; never returned by [`new_node`]).
pub const NULL_NODE_ID: u64 = 0;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque, globally unique node identity.
///
/// Equality is by identity only; the wrapped integer is an implementation
/// detail, never a value a caller should compute with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(u64);

impl Node {
    /// Constructs a node from a raw id. Only used by the allocator and by
    /// the external reader when round-tripping the canonical text form.
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Allocates a fresh, process-unique node identity.
///
/// No collisions occur across the life of the process: the allocator is a
/// single monotonic counter shared by every graph.
pub fn new_node() -> Node {
    Node(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Canonical external text form: `_:n<id>`, round-trippable via [`FromStr`].
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:n{}", self.0)
    }
}

/// Error returned when parsing a node's canonical text form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid node literal: {0:?}")]
pub struct ParseNodeError(String);

impl FromStr for Node {
    type Err = ParseNodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("_:n")
            .ok_or_else(|| ParseNodeError(s.to_string()))?;
        let id: u64 = digits.parse().map_err(|_| ParseNodeError(s.to_string()))?;
        if id == NULL_NODE_ID {
            return Err(ParseNodeError(s.to_string()));
        }
        Ok(Node(id))
    }
}
