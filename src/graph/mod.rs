//! The graph value: three rotationally-redundant indexes plus the
//! statement-id counter, and the two flavors (simple / multi) that share
//! one contract via a tagged variant.

pub mod resolve;
pub mod transitive;

use std::collections::HashSet;

use crate::error::{GraphError, Result};
use crate::index::Index;
use crate::triple::{Meta, Triple};
use crate::value::Value;

pub use resolve::{Binding, Pattern, Slot};

/// Which multiplicity semantics a [`Graph`] instance follows.
///
/// Dispatch is per-instance, not per-call-site: a `Graph` carries its own
/// flavor and every operation (`add`, `resolve`, `count_triple`) consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFlavor {
    /// Asserting an existing triple is a no-op; resolution yields one
    /// binding per distinct matching triple.
    Simple,
    /// Asserting an existing triple increments its count; resolution
    /// yields `count` identical bindings per matching triple.
    Multi,
}

/// The graph value: SPO / POS / OSP indexes in lock-step, plus the
/// per-graph monotonic statement-id counter.
#[derive(Debug, Clone)]
pub struct Graph {
    flavor: GraphFlavor,
    spo: Index,
    pos: Index,
    osp: Index,
    next_stmt_id: u64,
}

impl Graph {
    pub fn new(flavor: GraphFlavor) -> Self {
        Self {
            flavor,
            spo: Index::new(),
            pos: Index::new(),
            osp: Index::new(),
            next_stmt_id: 1,
        }
    }

    pub fn flavor(&self) -> GraphFlavor {
        self.flavor
    }

    pub(crate) fn spo(&self) -> &Index {
        &self.spo
    }
    pub(crate) fn pos(&self) -> &Index {
        &self.pos
    }
    pub(crate) fn osp(&self) -> &Index {
        &self.osp
    }

    /// Adds `(s, p, o)` at transaction `tx`, returning the updated graph.
    ///
    /// On a [`GraphFlavor::Simple`] graph, re-asserting an already-present
    /// triple is a no-op (the returned value is structurally identical to
    /// `self`); on [`GraphFlavor::Multi`] it increments the leaf's count.
    pub fn add(&self, s: Value, p: Value, o: Value, tx: u64) -> Self {
        if self.flavor == GraphFlavor::Simple && self.spo.contains(&s, &p, &o) {
            return self.clone();
        }

        let id = self.next_stmt_id;
        let spo = self.spo.add(s.clone(), p.clone(), o.clone(), tx, id);
        let pos = self.pos.add(p.clone(), o.clone(), s.clone(), tx, id);
        let osp = self.osp.add(o, s, p, tx, id);

        Self {
            flavor: self.flavor,
            spo,
            pos,
            osp,
            next_stmt_id: self.next_stmt_id + 1,
        }
    }

    /// Attempts to delete `(s, p, o)`. If the SPO index reports no change
    /// (the triple was never present, or was already fully retracted),
    /// returns an identical graph — POS/OSP are never touched in that case,
    /// since the three indexes must agree on presence.
    pub fn delete(&self, s: &Value, p: &Value, o: &Value) -> Self {
        let Some(spo) = self.spo.delete(s, p, o) else {
            return self.clone();
        };
        let pos = self
            .pos
            .delete(p, o, s)
            .expect("POS must agree with SPO on presence");
        let osp = self
            .osp
            .delete(o, s, p)
            .expect("OSP must agree with SPO on presence");

        Self {
            flavor: self.flavor,
            spo,
            pos,
            osp,
            next_stmt_id: self.next_stmt_id,
        }
    }

    /// Folds `delete` over `retractions`, then `add` over `assertions`.
    /// Retractions are applied first — this ordering is observable and
    /// assumed by tests.
    pub fn transact(&self, tx_id: u64, assertions: &[Triple], retractions: &[Triple]) -> Self {
        let mut g = self.clone();
        for t in retractions {
            g = g.delete(&t.s, &t.p, &t.o);
        }
        for t in assertions {
            g = g.add(t.s.clone(), t.p.clone(), t.o.clone(), tx_id);
        }
        g
    }

    /// Resolves a pattern into a lazy sequence of bindings, delegating to
    /// the transitive resolver when the pattern's predicate is tagged.
    pub fn resolve<'a>(&'a self, pattern: &'a Pattern) -> Box<dyn Iterator<Item = Binding> + 'a> {
        resolve::resolve(self, pattern)
    }

    /// Cardinality of `resolve`'s result, ignoring multiplicity: the number
    /// of distinct matching triples, not the sum of their counts.
    pub fn count_triple(&self, pattern: &Pattern) -> u64 {
        resolve::count_distinct(self, pattern)
    }

    /// The subjects whose `p -> o` sub-map differs between `self` and
    /// `other`. Fails with [`GraphError::IncompatibleGraphs`] if the flavors
    /// differ.
    pub fn diff(&self, other: &Graph) -> Result<HashSet<Value>> {
        if self.flavor != other.flavor {
            return Err(GraphError::IncompatibleGraphs);
        }
        let mut changed = HashSet::new();
        for (s, _) in self.spo.top().iter() {
            if !po_submaps_equal(self, other, s) {
                changed.insert(s.clone());
            }
        }
        for (s, _) in other.spo.top().iter() {
            if self.spo.top().get(s).is_none() {
                changed.insert(s.clone());
            }
        }
        Ok(changed)
    }

    pub(crate) fn leaf_meta(&self, s: &Value, p: &Value, o: &Value) -> Option<Meta> {
        self.spo.get(s, p, o)
    }
}

fn po_submaps_equal(a: &Graph, b: &Graph, s: &Value) -> bool {
    let (Some(a_mid), Some(b_mid)) = (a.spo.top().get(s), b.spo.top().get(s)) else {
        return a.spo.top().get(s).is_none() == b.spo.top().get(s).is_none();
    };
    if a_mid.len() != b_mid.len() {
        return false;
    }
    for (p, a_leaf) in a_mid.iter() {
        let Some(b_leaf) = b_mid.get(p) else {
            return false;
        };
        if a_leaf.len() != b_leaf.len() {
            return false;
        }
        for (o, _) in a_leaf.iter() {
            if b_leaf.get(o).is_none() {
                return false;
            }
        }
    }
    true
}
