//! The entity materializer: reconstructs nested maps and lists from the
//! triples radiating out of a node identity.

use std::collections::{BTreeSet, HashSet};

use crate::graph::{Graph, Pattern, Slot};
use crate::node::Node;
use crate::value::{Keyword, Value};

const DB_ID: &str = "db/id";
const DB_IDENT: &str = "db/ident";
const ID: &str = "id";
const A_ENTITY: &str = "a/entity";
const A_OWNS: &str = "a/owns";
const A_REST: &str = "a/rest";
const A_TYPE: &str = "a/type";
const A_LIST: &str = "a/list";
const A_NIL: &str = "a/nil";
const A_EMPTY_LIST: &str = "a/empty-list";

fn is_internal_attr(name: &str) -> bool {
    matches!(name, DB_ID | DB_IDENT | A_ENTITY | A_OWNS)
}

/// `:a/first`, `:a/first0`, `:a/first1`, ... — any digit suffix or none.
fn is_first_attr(name: &str) -> bool {
    name.strip_prefix("a/first")
        .map(|suffix| suffix.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// A materialized document: the nested shape described as "maps and
/// lists", plus scalar leaves and the multiplicity-collapsed set.
#[derive(Debug, Clone, PartialEq)]
pub enum Doc {
    Map(Vec<(Keyword, Doc)>),
    List(Vec<Doc>),
    /// Same-attribute multiplicity collapsed to a set of scalar values (a
    /// singleton when only one triple existed for that attribute).
    Values(BTreeSet<Value>),
    Scalar(Value),
}

impl Doc {
    fn single_scalar(v: Value) -> Doc {
        Doc::Scalar(v)
    }
}

fn node_attrs(graph: &Graph, node: &Value) -> Vec<(Keyword, Value)> {
    let pattern = Pattern::new(Slot::Const(node.clone()), Slot::Var, Slot::Var);
    graph
        .resolve(&pattern)
        .filter_map(|binding| {
            let p = binding[0].as_keyword().cloned()?;
            let o = binding[1].clone();
            Some((p, o))
        })
        .filter(|(attr, _)| !is_internal_attr(attr.as_str()))
        .collect()
}

fn group_by_attr(attrs: Vec<(Keyword, Value)>) -> Vec<(Keyword, Vec<Value>)> {
    let mut out: Vec<(Keyword, Vec<Value>)> = Vec::new();
    for (attr, val) in attrs {
        match out.iter_mut().find(|(a, _)| *a == attr) {
            Some((_, values)) => values.push(val),
            None => out.push((attr, vec![val])),
        }
    }
    out
}

fn is_sentinel_value(v: &Value) -> Option<Doc> {
    match v.as_keyword().map(Keyword::as_str) {
        Some(A_NIL) => Some(Doc::Scalar(Value::Nil)),
        Some(A_EMPTY_LIST) => Some(Doc::List(Vec::new())),
        _ => None,
    }
}

/// Materializes a single attribute value: sentinels resolve directly, node
/// values recurse, everything else is a scalar leaf.
fn materialize_value(graph: &Graph, val: &Value, seen: &HashSet<Value>, nested: bool) -> Doc {
    if let Some(sentinel) = is_sentinel_value(val) {
        return sentinel;
    }
    if matches!(val, Value::Node(_)) {
        return materialize_node(graph, val, seen, nested);
    }
    Doc::single_scalar(val.clone())
}

/// Walks a cons-cell chain (`:a/first*` / `:a/rest`) into an ordered list.
fn materialize_cons_chain(
    graph: &Graph,
    start: &Value,
    grouped: Vec<(Keyword, Vec<Value>)>,
    seen: &HashSet<Value>,
    nested: bool,
) -> Doc {
    let mut items = Vec::new();
    let mut current_node = start.clone();
    let mut current_grouped = grouped;
    let mut visited = HashSet::new();

    loop {
        if !visited.insert(current_node.clone()) {
            break; // cyclic cons chain; stop rather than loop forever
        }

        let first = current_grouped
            .iter()
            .find(|(attr, _)| is_first_attr(attr.as_str()))
            .and_then(|(_, values)| values.first());
        let Some(first) = first else { break };
        items.push(materialize_value(graph, first, seen, nested));

        let rest = current_grouped
            .iter()
            .find(|(attr, _)| attr.as_str() == A_REST)
            .and_then(|(_, values)| values.first())
            .cloned();
        let Some(rest) = rest else { break };

        if let Some(Doc::List(empty)) = is_sentinel_value(&rest) {
            debug_assert!(empty.is_empty());
            break;
        }
        if !matches!(rest, Value::Node(_)) {
            break;
        }
        let rest_attrs = group_by_attr(node_attrs(graph, &rest));
        if rest_attrs
            .iter()
            .any(|(attr, _)| attr.as_str() == A_TYPE)
            && rest_attrs
                .iter()
                .any(|(attr, vals)| attr.as_str() == A_TYPE && vals.iter().any(|v| v.as_keyword().map(Keyword::as_str) == Some(A_LIST)))
            && !rest_attrs.iter().any(|(attr, _)| is_first_attr(attr.as_str()))
        {
            break; // `:a/type :a/list` terminator with no further elements
        }

        current_node = rest.clone();
        current_grouped = rest_attrs;
    }

    Doc::List(items)
}

/// Recursively materializes the node `node` into a `Doc`, honoring `seen`
/// (cycle/shared-reference protection) and `nested` (non-nested mode emits
/// a placeholder for already-seen or `:a/entity true` children instead of
/// expanding them).
fn materialize_node(graph: &Graph, node: &Value, seen: &HashSet<Value>, nested: bool) -> Doc {
    if seen.contains(node) {
        return placeholder(graph, node);
    }

    let attrs = node_attrs(graph, node);
    let grouped = group_by_attr(attrs);

    let is_entity_marker = grouped
        .iter()
        .any(|(attr, vals)| attr.as_str() == A_ENTITY && vals.iter().any(Value::is_truthy));
    if !nested && is_entity_marker {
        return placeholder(graph, node);
    }

    if grouped.iter().any(|(attr, _)| is_first_attr(attr.as_str())) {
        let mut child_seen = seen.clone();
        child_seen.insert(node.clone());
        return materialize_cons_chain(graph, node, grouped, &child_seen, nested);
    }

    let is_empty_list_type = grouped.iter().any(|(attr, vals)| {
        attr.as_str() == A_TYPE && vals.iter().any(|v| v.as_keyword().map(Keyword::as_str) == Some(A_LIST))
    });
    if is_empty_list_type {
        return Doc::List(Vec::new());
    }

    let mut child_seen = seen.clone();
    child_seen.insert(node.clone());

    let mut map = Vec::with_capacity(grouped.len());
    for (attr, values) in grouped {
        let docs: Vec<Doc> = values
            .iter()
            .map(|v| materialize_value(graph, v, &child_seen, nested))
            .collect();
        let collapsed = collapse_multiplicity(docs);
        map.push((attr, collapsed));
    }
    Doc::Map(map)
}

/// Collapses an attribute's resolved value docs: a singleton is returned
/// as-is; multiple scalar docs collapse into a `Values` set; multiple
/// non-scalar (recursively materialized) docs are kept as a list, since a
/// `BTreeSet<Value>` cannot hold nested documents.
fn collapse_multiplicity(mut docs: Vec<Doc>) -> Doc {
    if docs.len() == 1 {
        return docs.pop().unwrap();
    }
    if docs.iter().all(|d| matches!(d, Doc::Scalar(_))) {
        let set: BTreeSet<Value> = docs
            .into_iter()
            .map(|d| match d {
                Doc::Scalar(v) => v,
                _ => unreachable!(),
            })
            .collect();
        return Doc::Values(set);
    }
    Doc::List(docs)
}

fn placeholder(graph: &Graph, node: &Value) -> Doc {
    if let Some(ident) = reverse_lookup(graph, node, DB_IDENT) {
        return Doc::Map(vec![(Keyword::new(DB_IDENT), Doc::Scalar(ident))]);
    }
    Doc::Map(vec![(Keyword::new(DB_ID), Doc::Scalar(node.clone()))])
}

fn reverse_lookup(graph: &Graph, node: &Value, attr: &str) -> Option<Value> {
    let pattern = Pattern::new(Slot::Const(node.clone()), Slot::Const(Value::Keyword(Keyword::new(attr))), Slot::Var);
    graph.resolve(&pattern).next().map(|b| b[0].clone())
}

/// Materializes `entity` (a node identity) into a nested document.
///
/// `nested = false` selects "non-nested mode": children already
/// visited, or tagged `:a/entity true`, are rendered as `{:db/ident _}` /
/// `{:db/id _}` placeholders instead of being expanded.
pub fn materialize_entity(graph: &Graph, entity: Node, nested: bool) -> Doc {
    let node_value = Value::Node(entity);
    materialize_node(graph, &node_value, &HashSet::new(), nested)
}

/// The symmetric ident resolver: accepts an internal node or a user-facing
/// identifier (`:db/ident`/`:id` attribute value) and returns the
/// corresponding node, or `None` if nothing matches.
pub fn resolve_ident(graph: &Graph, ident: &Value) -> Option<Node> {
    if let Value::Node(n) = ident {
        // Direct triple presence: does this node actually appear as a
        // subject anywhere?
        let pattern = Pattern::new(Slot::Const(ident.clone()), Slot::Var, Slot::Var);
        if graph.resolve(&pattern).next().is_some() {
            return Some(*n);
        }
    }

    for attr in [DB_IDENT, ID] {
        let pattern = Pattern::new(
            Slot::Var,
            Slot::Const(Value::Keyword(Keyword::new(attr))),
            Slot::Const(ident.clone()),
        );
        if let Some(binding) = graph.resolve(&pattern).next() {
            if let Some(node) = binding[0].as_node() {
                return Some(node);
            }
        }
    }
    None
}
