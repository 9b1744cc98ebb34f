//! Binding rows and clause execution: turns a planned clause list into the
//! join state (a set of rows) by repeatedly extending/filtering it.

use std::collections::HashMap;

use crate::error::Result;
use crate::graph::{Binding as GraphBinding, Graph, Pattern as GPattern, Slot as GSlot};
use crate::query::ast::{BindTarget, Clause, PatternSlot, QPattern};
use crate::query::expr::{self, ExprEnv};
use crate::value::Value;

/// A binding row: a mapping from variable name to value. Variables absent
/// from a row (e.g. because an `Or` branch never bound them) read as
/// `Value::Nil` at projection/expression-evaluation time.
#[derive(Debug, Clone, Default)]
pub struct Row {
    bindings: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(bindings: HashMap<String, Value>) -> Self {
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn with(&self, name: String, value: Value) -> Row {
        let mut next = self.clone();
        next.bindings.insert(name, value);
        next
    }

    pub fn vars(&self) -> impl Iterator<Item = &String> {
        self.bindings.keys()
    }
}

/// Converts a named query pattern into a graph pattern under `row`'s
/// current bindings: a variable already bound in the row acts as a join
/// constant; otherwise it remains a wildcard to be (re)bound.
fn to_graph_pattern(qp: &QPattern, row: &Row) -> (GPattern, [Option<String>; 3]) {
    let mut names: [Option<String>; 3] = [None, None, None];
    let slot = |i: usize, s: &PatternSlot, names: &mut [Option<String>; 3]| -> GSlot {
        match s {
            PatternSlot::Const(v) => GSlot::Const(v.clone()),
            PatternSlot::Var(name) => {
                if let Some(bound) = row.get(name) {
                    GSlot::Const(bound.clone())
                } else {
                    names[i] = Some(name.clone());
                    GSlot::Var
                }
            }
        }
    };
    let s = slot(0, &qp.s, &mut names);
    let p = slot(1, &qp.p, &mut names);
    let o = slot(2, &qp.o, &mut names);
    (GPattern::new(s, p, o), names)
}

fn extend_row_with_binding(row: &Row, names: &[Option<String>; 3], binding: &GraphBinding) -> Row {
    let mut out = row.clone();
    let mut bi = 0;
    for name in names.iter().flatten() {
        out = out.with(name.clone(), binding[bi].clone());
        bi += 1;
    }
    out
}

fn execute_pattern<'a>(graph: &'a Graph, qp: &'a QPattern, rows: Vec<Row>) -> Vec<Row> {
    let mut out = Vec::new();
    for row in rows {
        let (gp, names) = to_graph_pattern(qp, &row);
        for binding in graph.resolve(&gp) {
            out.push(extend_row_with_binding(&row, &names, &binding));
        }
    }
    out
}

fn execute_not(graph: &Graph, sub: &[Clause], rows: Vec<Row>, env: &ExprEnv) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    for row in rows {
        let sub_rows = execute_clauses(graph, sub, vec![row.clone()], env)?;
        if sub_rows.is_empty() {
            out.push(row);
        }
    }
    Ok(out)
}

fn execute_or(
    graph: &Graph,
    branches: &[Vec<Clause>],
    rows: Vec<Row>,
    env: &ExprEnv,
) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    for row in rows {
        for branch in branches {
            let branch_rows = execute_clauses(graph, branch, vec![row.clone()], env)?;
            out.extend(branch_rows);
        }
    }
    Ok(out)
}

fn execute_filter(expr: &crate::query::ast::Expr, rows: Vec<Row>, env: &ExprEnv) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    for row in rows {
        if expr::eval(expr, &row, env)?.is_truthy() {
            out.push(row);
        }
    }
    Ok(out)
}

fn execute_bind(
    expr: &crate::query::ast::Expr,
    target: &BindTarget,
    rows: Vec<Row>,
    env: &ExprEnv,
) -> Result<Vec<Row>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let value = expr::eval(expr, &row, env)?;
        let extended = match target {
            BindTarget::Var(name) => row.with(name.clone(), value),
            BindTarget::Tuple(names) => {
                let items = match value {
                    Value::Tuple(items) => items,
                    other => vec![other],
                };
                let mut r = row;
                for (name, v) in names.iter().zip(items.into_iter()) {
                    r = r.with(name.clone(), v);
                }
                r
            }
        };
        out.push(extended);
    }
    Ok(out)
}

/// Executes `clauses` in the given order against `rows`, returning the
/// resulting join state.
pub fn execute_clauses(
    graph: &Graph,
    clauses: &[Clause],
    mut rows: Vec<Row>,
    env: &ExprEnv,
) -> Result<Vec<Row>> {
    for clause in clauses {
        rows = match clause {
            Clause::Pattern(qp) => execute_pattern(graph, qp, rows),
            Clause::Not(sub) => execute_not(graph, sub, rows, env)?,
            Clause::Or(branches) => execute_or(graph, branches, rows, env)?,
            Clause::Filter(expr) => execute_filter(expr, rows, env)?,
            Clause::Bind(expr, target) => execute_bind(expr, target, rows, env)?,
        };
        if rows.is_empty() {
            break;
        }
    }
    Ok(rows)
}
