//! `+`/`*` transitive traversal over a single predicate.

use std::collections::HashSet;

use crate::graph::Graph;
use crate::value::Value;

/// Forward BFS from `start` along `base`, returning every node reachable
/// with one or more hops (visited set prevents cycles from looping).
pub fn forward_plus(graph: &Graph, base: &Value, start: &Value) -> Vec<Value> {
    let mut visited: HashSet<Value> = HashSet::new();
    let mut frontier = vec![start.clone()];
    let mut out = Vec::new();

    while let Some(s) = frontier.pop() {
        if let Some(mid) = graph.spo().top().get(&s) {
            if let Some(objs) = mid.get(base) {
                for (o, _) in objs.iter() {
                    if visited.insert(o.clone()) {
                        out.push(o.clone());
                        frontier.push(o.clone());
                    }
                }
            }
        }
    }
    out
}

/// Backward BFS: every node that can reach `target` via one or more hops.
pub fn backward_plus(graph: &Graph, base: &Value, target: &Value) -> Vec<Value> {
    let mut visited: HashSet<Value> = HashSet::new();
    let mut frontier = vec![target.clone()];
    let mut out = Vec::new();

    while let Some(o) = frontier.pop() {
        if let Some(mid) = graph.pos().top().get(base) {
            if let Some(subjs) = mid.get(&o) {
                for (s, _) in subjs.iter() {
                    if visited.insert(s.clone()) {
                        out.push(s.clone());
                        frontier.push(s.clone());
                    }
                }
            }
        }
    }
    out
}

/// True if there is a one-or-more-hop path from `s` to `o` along `base`.
pub fn path_exists(graph: &Graph, base: &Value, s: &Value, o: &Value) -> bool {
    forward_plus(graph, base, s).iter().any(|n| n == o)
}

/// True if `s == o` (reflexive hop) or a one-or-more-hop path exists.
pub fn reflexive_path_exists(graph: &Graph, base: &Value, s: &Value, o: &Value) -> bool {
    s == o || path_exists(graph, base, s, o)
}

/// `s` itself, followed by every node reachable in one or more hops —
/// the `*` (reflexive closure) form with `s` bound.
pub fn forward_star(graph: &Graph, base: &Value, start: &Value) -> Vec<Value> {
    let mut out = vec![start.clone()];
    out.extend(forward_plus(graph, base, start));
    out
}

/// `o` itself, followed by every node that can reach `o`.
pub fn backward_star(graph: &Graph, base: &Value, target: &Value) -> Vec<Value> {
    let mut out = vec![target.clone()];
    out.extend(backward_plus(graph, base, target));
    out
}

/// Upper-bound estimate for an all-wildcard transitive pattern, used only
/// by the planner's selectivity heuristic. This is not a true count: tests
/// must not rely on its exactness.
pub fn count_estimate(graph: &Graph) -> u64 {
    graph.spo().top().len() as u64 * graph.osp().top().len() as u64
}
