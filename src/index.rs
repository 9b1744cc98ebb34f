//! The persistent, structurally-shared three-level map that backs each of
//! the graph's three index rotations (SPO, POS, OSP).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::triple::Meta;
use crate::value::Value;

/// An immutable, reference-counted map. `insert`/`remove` copy only this
/// level's hash table; every value stored in it (itself often another
/// `ArcMap`) is shared by `Arc` clone with the predecessor map, so an update
/// anywhere in the three-level index only rebuilds the path from the
/// touched leaf to the root — unrelated subtrees are never deep-copied.
#[derive(Debug, Clone)]
pub struct ArcMap<V>(Arc<FxHashMap<Value, V>>);

impl<V: Clone> Default for ArcMap<V> {
    fn default() -> Self {
        Self(Arc::new(FxHashMap::default()))
    }
}

impl<V: Clone> ArcMap<V> {
    pub fn get(&self, key: &Value) -> Option<&V> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &V)> + '_ {
        self.0.iter()
    }

    /// Returns a new map with `key` bound to `value`, sharing every other
    /// entry with `self`.
    pub fn inserted(&self, key: Value, value: V) -> Self {
        let mut next = (*self.0).clone();
        next.insert(key, value);
        Self(Arc::new(next))
    }

    /// Returns a new map with `key` removed, or `None` if the key was
    /// absent (the explicit "no change" sentinel, see DESIGN.md).
    pub fn removed(&self, key: &Value) -> Option<Self> {
        if !self.0.contains_key(key) {
            return None;
        }
        let mut next = (*self.0).clone();
        next.remove(key);
        Some(Self(Arc::new(next)))
    }
}

/// One rotation of the three-level triple index: `a -> b -> c -> meta`.
///
/// For SPO, `a=s, b=p, c=o`; for POS, `a=p, b=o, c=s`; for OSP,
/// `a=o, b=s, c=p`. The resolver and graph value pick the rotation and the
/// argument order appropriate to the pattern shape; this type only knows
/// about three opaque levels.
#[derive(Debug, Clone, Default)]
pub struct Index {
    root: ArcMap<ArcMap<ArcMap<Meta>>>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(&self) -> &ArcMap<ArcMap<ArcMap<Meta>>> {
        &self.root
    }

    pub fn get(&self, a: &Value, b: &Value, c: &Value) -> Option<Meta> {
        self.root.get(a)?.get(b)?.get(c).copied()
    }

    pub fn contains(&self, a: &Value, b: &Value, c: &Value) -> bool {
        self.get(a, b, c).is_some()
    }

    /// If `idx[a][b][c]` exists, increments its `count`; otherwise inserts a
    /// fresh leaf with `count = 1`.
    pub fn add(&self, a: Value, b: Value, c: Value, tx: u64, id: u64) -> Self {
        let mid = self.root.get(&a).cloned().unwrap_or_default();
        let leaf_map = mid.get(&b).cloned().unwrap_or_default();

        let new_meta = match leaf_map.get(&c) {
            Some(existing) => Meta {
                count: existing.count + 1,
                t: existing.t,
                id: existing.id,
            },
            None => Meta { count: 1, t: tx, id },
        };

        let leaf_map = leaf_map.inserted(c, new_meta);
        let mid = mid.inserted(b, leaf_map);
        let root = self.root.inserted(a, mid);
        Self { root }
    }

    /// If the leaf is absent, returns `None` (no change). If `count > 1`,
    /// decrements it. If `count == 1`, removes the leaf and prunes every
    /// interior map that becomes empty, up to the root.
    pub fn delete(&self, a: &Value, b: &Value, c: &Value) -> Option<Self> {
        let mid = self.root.get(a)?;
        let leaf_map = mid.get(b)?;
        let existing = leaf_map.get(c)?;

        if existing.count > 1 {
            let new_meta = Meta {
                count: existing.count - 1,
                t: existing.t,
                id: existing.id,
            };
            let leaf_map = leaf_map.inserted(c.clone(), new_meta);
            let mid = mid.inserted(b.clone(), leaf_map);
            let root = self.root.inserted(a.clone(), mid);
            return Some(Self { root });
        }

        // count == 1: remove the leaf, pruning empty maps upward.
        let leaf_map = leaf_map
            .removed(c)
            .expect("leaf present since `get` above succeeded");

        let root = if leaf_map.is_empty() {
            match mid.removed(b) {
                Some(pruned_mid) if pruned_mid.is_empty() => {
                    self.root.removed(a).expect("a present since mid found above")
                }
                Some(pruned_mid) => self.root.inserted(a.clone(), pruned_mid),
                None => unreachable!("b present since leaf_map found above"),
            }
        } else {
            let mid = mid.inserted(b.clone(), leaf_map);
            self.root.inserted(a.clone(), mid)
        };

        Some(Self { root })
    }
}
