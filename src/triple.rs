//! Triples and the multi-edge metadata attached to each index leaf.

use serde::{Deserialize, Serialize};

use crate::value::{Keyword, Value};

/// A single (subject, predicate, object) assertion.
///
/// Derives `serde::{Serialize, Deserialize}` so the external transaction
/// payload's raw `[e a v]` vectors can be read directly into
/// this type without going through the out-of-scope entity-to-triples
/// encoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub s: Value,
    pub p: Value,
    pub o: Value,
}

impl Triple {
    pub fn new(s: impl Into<Value>, p: impl Into<Value>, o: impl Into<Value>) -> Self {
        Self {
            s: s.into(),
            p: p.into(),
            o: o.into(),
        }
    }
}

/// Metadata carried by every leaf in an index.
///
/// `count` ignores multiplicity for ordinary (simple-graph) resolution; it
/// only matters to [`crate::graph::MultiGraph`] and to `count_triple`'s
/// "ignore multiplicity" contract, which always treats a present leaf as one
/// binding regardless of `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    /// Number of asserted copies of this triple.
    pub count: u64,
    /// Transaction id at which this leaf was (first) created.
    pub t: u64,
    /// Monotonically increasing per-graph statement id, assigned once at
    /// first assertion and never reassigned by later re-assertions.
    pub id: u64,
}

/// Traversal mode for a predicate tagged transitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitiveMode {
    /// `+`: one or more hops.
    Plus,
    /// `*`: zero or more hops (reflexive closure).
    Star,
}

/// A predicate wrapped with a transitive traversal mode.
///
/// Decoded once at pattern-construction time from a keyword whose name ends
/// in `+` or `*` (e.g. `:a/knows+`); the base keyword (`:a/knows`) is what
/// actually indexes the underlying triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitivePredicate {
    pub base: Keyword,
    pub mode: TransitiveMode,
}

impl TransitivePredicate {
    /// Attempts to decode a transitive-tagged predicate from a plain value.
    /// Returns `None` for anything that is not a keyword ending in `+`/`*`.
    pub fn decode(v: &Value) -> Option<Self> {
        let kw = v.as_keyword()?;
        let text = kw.as_str();
        let (base, mode) = if let Some(stripped) = text.strip_suffix('+') {
            (stripped, TransitiveMode::Plus)
        } else if let Some(stripped) = text.strip_suffix('*') {
            (stripped, TransitiveMode::Star)
        } else {
            return None;
        };
        Some(Self {
            base: Keyword::new(base),
            mode,
        })
    }
}
