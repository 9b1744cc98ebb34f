//! The query engine: AST, sandboxed expression evaluation, the planner, join
//! execution, and projection, composed into a single entry point.

pub mod ast;
pub mod exec;
pub mod expr;
pub mod plan;
pub mod project;

use std::collections::HashMap;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::query::ast::{InputSpec, Query};
use crate::query::exec::Row;
use crate::query::expr::ExprEnv;
use crate::query::project::QueryResult;
use crate::value::Value;

fn bind_inputs(specs: &[InputSpec], inputs: &[Value], rows: Vec<Row>) -> Result<Vec<Row>> {
    if specs.len() > inputs.len() {
        return Err(GraphError::MissingClause("in"));
    }
    let mut rows = rows;
    for (spec, value) in specs.iter().zip(inputs.iter()) {
        rows = match spec {
            InputSpec::Scalar(name) => rows
                .into_iter()
                .map(|r| r.with(name.clone(), value.clone()))
                .collect(),
            InputSpec::Tuple(names) => {
                let items = match value {
                    Value::Tuple(items) => items.clone(),
                    other => vec![other.clone()],
                };
                rows.into_iter()
                    .map(|r| {
                        let mut r = r;
                        for (name, v) in names.iter().zip(items.iter()) {
                            r = r.with(name.clone(), v.clone());
                        }
                        r
                    })
                    .collect()
            }
            InputSpec::Collection(name) => {
                let items = match value {
                    Value::Tuple(items) => items.clone(),
                    other => vec![other.clone()],
                };
                let mut expanded = Vec::with_capacity(rows.len() * items.len().max(1));
                for r in rows {
                    for item in &items {
                        expanded.push(r.with(name.clone(), item.clone()));
                    }
                }
                expanded
            }
        };
    }
    Ok(rows)
}

/// Runs `query` against `graph`.
///
/// `inputs` are positional values for the query's `:in` bindings, in order
/// (an implicit `$` graph input is not modeled as a value — the graph is
/// always the one passed here). `env` resolves `Bind`/`Filter` function
/// calls that are not part of the built-in safelist.
pub fn query(graph: &Graph, q: &Query, env: &ExprEnv, inputs: &[Value]) -> Result<QueryResult> {
    if q.where_.is_empty() {
        return Err(GraphError::MissingClause("where"));
    }

    let rows = bind_inputs(&q.in_, inputs, vec![Row::new()])?;
    let planned = plan::plan(graph, q.where_.clone(), q.planner);
    let rows = exec::execute_clauses(graph, &planned, rows, env)?;
    project::project(&q.find, &q.with, rows)
}

/// Result metadata: the output column names for a `Relation`/`FirstTuple`
/// find spec, keyed by position. Empty for `Scalar`/`Coll` shapes, which
/// have no column labels.
pub fn result_columns(find: &crate::query::ast::FindSpec) -> HashMap<usize, String> {
    use crate::query::ast::{AggArg, FindVar};
    let label = |v: &FindVar| match v {
        FindVar::Var(name) => name.clone(),
        FindVar::Agg(kind, AggArg::Star) => format!("{kind:?}(*)"),
        FindVar::Agg(kind, AggArg::Var(name)) => format!("{kind:?}({name})"),
    };
    match find {
        crate::query::ast::FindSpec::Relation(vars)
        | crate::query::ast::FindSpec::FirstTuple(vars) => vars
            .iter()
            .enumerate()
            .map(|(i, v)| (i, label(v)))
            .collect(),
        _ => HashMap::new(),
    }
}
