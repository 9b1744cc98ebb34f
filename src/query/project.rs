//! Projection: turns the executed join state (a set of [`Row`]s) into the
//! shape `find` asked for, including grouping and aggregation.

use serde::Serialize;

use crate::error::{GraphError, Result};
use crate::query::ast::{AggArg, AggKind, FindSpec, FindVar};
use crate::query::exec::Row;
use crate::value::{OrderedFloat, Value};

/// The projected result of a query. `Relation`/`FirstTuple` carry the output
/// column order alongside their rows so a caller can label columns without
/// re-deriving it from the `find` spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResult {
    Relation(Vec<String>, Vec<Vec<Value>>),
    Scalar(Value),
    Coll(Vec<Value>),
}

fn find_var_name(v: &FindVar) -> String {
    match v {
        FindVar::Var(name) => name.clone(),
        FindVar::Agg(kind, arg) => {
            let arg_label = match arg {
                AggArg::Var(name) => name.clone(),
                AggArg::Star => "*".to_string(),
            };
            format!("{kind:?}({arg_label})")
        }
    }
}

fn read(row: &Row, var: &FindVar) -> Value {
    match var {
        FindVar::Var(name) => row.get(name).cloned().unwrap_or(Value::Nil),
        FindVar::Agg(_, _) => unreachable!("aggregate columns are computed, not read"),
    }
}

fn is_aggregate(v: &FindVar) -> bool {
    matches!(v, FindVar::Agg(_, _))
}

fn group_key(row: &Row, group_vars: &[&str]) -> Vec<Value> {
    group_vars
        .iter()
        .map(|name| row.get(name).cloned().unwrap_or(Value::Nil))
        .collect()
}

fn agg_values(rows: &[&Row], arg: &AggArg) -> Vec<Value> {
    match arg {
        AggArg::Star => rows.iter().map(|_| Value::Nil).collect(),
        AggArg::Var(name) => rows
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or(Value::Nil))
            .collect(),
    }
}

fn compute_agg(kind: AggKind, arg: &AggArg, rows: &[&Row]) -> Result<Value> {
    if !matches!(kind, AggKind::Count | AggKind::CountDistinct) && matches!(arg, AggArg::Star) {
        return Err(GraphError::IllegalAggregate(format!(
            "{kind:?} cannot aggregate over `*`"
        )));
    }

    let values = agg_values(rows, arg);
    Ok(match kind {
        AggKind::Count => Value::Int(values.len() as i64),
        AggKind::CountDistinct => {
            let mut seen = std::collections::HashSet::new();
            for v in &values {
                seen.insert(v.clone());
            }
            Value::Int(seen.len() as i64)
        }
        AggKind::Sum => {
            let sum: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
            Value::Float(OrderedFloat::new(sum).unwrap_or(OrderedFloat::new(0.0).unwrap()))
        }
        AggKind::Min => values
            .into_iter()
            .filter(|v| !matches!(v, Value::Nil))
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(Value::Nil),
        AggKind::Max => values
            .into_iter()
            .filter(|v| !matches!(v, Value::Nil))
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or(Value::Nil),
        AggKind::Avg => {
            let nums: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
            if nums.is_empty() {
                Value::Nil
            } else {
                let avg = nums.iter().sum::<f64>() / nums.len() as f64;
                Value::Float(OrderedFloat::new(avg).unwrap_or(OrderedFloat::new(0.0).unwrap()))
            }
        }
    })
}

/// Projects `rows` according to `find`. `with` names extra grouping-only
/// variables that widen the implicit group key without appearing in the
/// output (the `:with` clause).
fn project_vars(find_vars: &[&FindVar], with: &[String], rows: Vec<Row>) -> Result<Vec<Vec<Value>>> {
    let has_agg = find_vars.iter().any(|v| is_aggregate(v));
    if !has_agg {
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(find_vars.iter().map(|v| read(row, v)).collect());
        }
        return Ok(out);
    }

    let group_vars: Vec<&str> = find_vars
        .iter()
        .filter_map(|v| match v {
            FindVar::Var(name) => Some(name.as_str()),
            FindVar::Agg(_, _) => None,
        })
        .chain(with.iter().map(|s| s.as_str()))
        .collect();

    // `Value` has no total order (only the partial order used by
    // `min`/`max`/comparisons), so groups are accumulated in a plain
    // first-seen-order vector rather than a `BTreeMap`.
    let mut groups: Vec<(Vec<Value>, Vec<&Row>)> = Vec::new();
    for row in &rows {
        let key = group_key(row, &group_vars);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucket)) => bucket.push(row),
            None => groups.push((key, vec![row])),
        }
    }
    if groups.is_empty() && !rows.is_empty() {
        groups.push((Vec::new(), rows.iter().collect()));
    }

    let mut out = Vec::with_capacity(groups.len());
    for (_key, group_rows) in groups {
        let representative = group_rows.first().copied();
        let mut tuple = Vec::with_capacity(find_vars.len());
        for v in find_vars {
            match v {
                FindVar::Var(name) => tuple.push(
                    representative
                        .and_then(|r| r.get(name).cloned())
                        .unwrap_or(Value::Nil),
                ),
                FindVar::Agg(kind, arg) => tuple.push(compute_agg(*kind, arg, &group_rows)?),
            }
        }
        out.push(tuple);
    }
    Ok(out)
}

/// Projects the executed join state `rows` into the shape `find` describes.
pub fn project(find: &FindSpec, with: &[String], rows: Vec<Row>) -> Result<QueryResult> {
    match find {
        FindSpec::Relation(vars) => {
            let var_refs: Vec<&FindVar> = vars.iter().collect();
            let names = vars.iter().map(find_var_name).collect();
            let tuples = project_vars(&var_refs, with, rows)?;
            Ok(QueryResult::Relation(names, tuples))
        }
        FindSpec::FirstTuple(vars) => {
            let var_refs: Vec<&FindVar> = vars.iter().collect();
            let names = vars.iter().map(find_var_name).collect();
            let mut tuples = project_vars(&var_refs, with, rows)?;
            tuples.truncate(1);
            Ok(QueryResult::Relation(names, tuples))
        }
        FindSpec::Scalar(var) => {
            let var_refs = [var];
            let tuples = project_vars(&var_refs, with, rows)?;
            Ok(QueryResult::Scalar(
                tuples.into_iter().next().and_then(|t| t.into_iter().next()).unwrap_or(Value::Nil),
            ))
        }
        FindSpec::Coll(var) => {
            let var_refs = [var];
            let tuples = project_vars(&var_refs, with, rows)?;
            Ok(QueryResult::Coll(
                tuples.into_iter().filter_map(|t| t.into_iter().next()).collect(),
            ))
        }
    }
}
