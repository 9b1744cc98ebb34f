//! The query abstract syntax: `find` / `in` / `with` / `where`.
//!
//! This is the structured value the engine consumes. Parsing a textual
//! query surface (the Lisp-like `[:find ?x :where ...]` notation) into this
//! AST is the out-of-scope "surface query parser" collaborator; `Query` and
//! its pieces derive `serde::{Serialize, Deserialize}` so any JSON producer
//! — including this crate's CLI — can hand the engine an already-structured
//! query.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One slot of a named query pattern: either a literal constant or a named
/// variable (`?x`) to bind/consult.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSlot {
    Const(Value),
    Var(String),
}

impl PatternSlot {
    pub fn var(name: impl Into<String>) -> Self {
        PatternSlot::Var(name.into())
    }
    pub fn constant(v: impl Into<Value>) -> Self {
        PatternSlot::Const(v.into())
    }
}

/// A triple pattern over named variables, e.g. `[?r :release/name "MSL"]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QPattern {
    pub s: PatternSlot,
    pub p: PatternSlot,
    pub o: PatternSlot,
}

impl QPattern {
    pub fn new(s: PatternSlot, p: PatternSlot, o: PatternSlot) -> Self {
        Self { s, p, o }
    }
}

/// An expression in the `Bind`/`Filter` sublanguage: literals, variables,
/// and function applications (built-ins or environment-supplied).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Lit(Value),
    Var(String),
    App(String, Vec<Expr>),
}

/// The destructuring target of a `Bind` clause: a single variable, or a
/// vector destructure of a tuple-valued expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindTarget {
    Var(String),
    Tuple(Vec<String>),
}

/// One `where` clause.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    Pattern(QPattern),
    /// Anti-join: drop rows for which the nested conjunction yields any match.
    Not(Vec<Clause>),
    /// Union: each branch is its own conjunction, evaluated independently in
    /// the same incoming environment.
    Or(Vec<Vec<Clause>>),
    Filter(Expr),
    Bind(Expr, BindTarget),
}

/// One grouping/aggregate variable of a `find` spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindVar {
    Var(String),
    Agg(AggKind, AggArg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggKind {
    Count,
    CountDistinct,
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggArg {
    Var(String),
    /// `*`: "row" — valid only for `count`/`count-distinct`.
    Star,
}

/// The shape of a query's projected output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindSpec {
    /// `[?x ?y]` — relation of tuples (the default shape).
    Relation(Vec<FindVar>),
    /// `[?x .]` — scalar: the first tuple's first column.
    Scalar(FindVar),
    /// `[[?x ...]]` — flat collection of the first column.
    Coll(FindVar),
    /// `[[?x ?y]]` — the first tuple only.
    FirstTuple(Vec<FindVar>),
}

impl FindSpec {
    pub fn vars(&self) -> Vec<&FindVar> {
        match self {
            FindSpec::Relation(vs) | FindSpec::FirstTuple(vs) => vs.iter().collect(),
            FindSpec::Scalar(v) | FindSpec::Coll(v) => vec![v],
        }
    }
}

/// One positional `:in` binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSpec {
    /// A scalar input bound to a single variable name.
    Scalar(String),
    /// `[?x ...]` — expands a single input list into per-row bindings,
    /// cartesian-producted with the current state.
    Collection(String),
    /// `[?x ?y]` — destructures one input tuple into several variables.
    Tuple(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerMode {
    Auto,
    User,
}

impl Default for PlannerMode {
    fn default() -> Self {
        PlannerMode::Auto
    }
}

/// A query's abstract syntax, already validated to have a `find` and
/// `where`. Use [`Query::from_json`] to build one from a raw JSON map with
/// `MissingClause`/`UnknownClauses` validation; `Query::new` is for callers
/// constructing an already-valid AST directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub find: FindSpec,
    #[serde(default, rename = "in")]
    pub in_: Vec<InputSpec>,
    #[serde(default)]
    pub with: Vec<String>,
    #[serde(rename = "where")]
    pub where_: Vec<Clause>,
    #[serde(default)]
    pub planner: PlannerMode,
}

/// The only keys a query map may carry. Anything else is rejected by
/// [`Query::from_json`] rather than silently ignored.
const RECOGNIZED_KEYS: &[&str] = &["find", "in", "with", "where", "planner"];

impl Query {
    pub fn new(find: FindSpec, where_: Vec<Clause>) -> Self {
        Self {
            find,
            in_: Vec::new(),
            with: Vec::new(),
            where_,
            planner: PlannerMode::Auto,
        }
    }

    pub fn with_inputs(mut self, in_: Vec<InputSpec>) -> Self {
        self.in_ = in_;
        self
    }

    pub fn with_grouping_only(mut self, with: Vec<String>) -> Self {
        self.with = with;
        self
    }

    pub fn with_planner(mut self, planner: PlannerMode) -> Self {
        self.planner = planner;
        self
    }

    /// Parses a query map: rejects unknown top-level keys
    /// with `UnknownClauses`, rejects a missing `find`/`where` with
    /// `MissingClause`, and only then deserializes the recognized shape.
    pub fn from_json(value: serde_json::Value) -> crate::error::Result<Query> {
        let obj = value
            .as_object()
            .ok_or(crate::error::GraphError::MissingClause("find"))?;

        let unknown: Vec<String> = obj
            .keys()
            .filter(|k| !RECOGNIZED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(crate::error::GraphError::UnknownClauses(unknown));
        }
        if !obj.contains_key("find") {
            return Err(crate::error::GraphError::MissingClause("find"));
        }
        if !obj.contains_key("where") {
            return Err(crate::error::GraphError::MissingClause("where"));
        }

        serde_json::from_value(value).map_err(|e| {
            crate::error::GraphError::UnsupportedOperation(format!("invalid query shape: {e}"))
        })
    }
}
