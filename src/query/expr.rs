//! The expression sublanguage consumed by `Bind`/`Filter` clauses, and its
//! sandboxed name resolution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::{GraphError, Result};
use crate::query::ast::Expr;
use crate::query::exec::Row;
use crate::value::{OrderedFloat, Value};

/// A user function reachable from `Bind`/`Filter`, supplied either as a
/// query input (`:in $ ?fn`) or through the ambient environment.
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// The name resolution environment for expression evaluation: an ambient
/// name→function mapping plus the built-in safelist. Free-standing symbols
/// that resolve to neither fail with `UnsupportedOperation` — this is the
/// sandbox.
#[derive(Clone, Default)]
pub struct ExprEnv {
    ambient: HashMap<String, HostFn>,
    /// Lifts the sandbox restriction for this evaluation only, additionally
    /// consulting the process-wide unsafe extension registry below.
    pub allow_unsafe_extensions: bool,
}

impl ExprEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ambient(mut self, name: impl Into<String>, f: HostFn) -> Self {
        self.ambient.insert(name.into(), f);
        self
    }

    fn resolve(&self, name: &str) -> Option<HostFn> {
        self.ambient.get(name).cloned().or_else(|| {
            if self.allow_unsafe_extensions {
                unsafe_extensions().lock().ok()?.get(name).cloned()
            } else {
                None
            }
        })
    }
}

/// Process-wide escape hatch consulted only when a call site explicitly
/// opts in via [`ExprEnv::allow_unsafe_extensions`] — not reachable from a
/// query payload alone, since it is in-process registration, never
/// serialized with the query.
fn unsafe_extensions() -> &'static Mutex<HashMap<String, HostFn>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, HostFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn register_unsafe_extension(name: impl Into<String>, f: HostFn) {
    if let Ok(mut reg) = unsafe_extensions().lock() {
        reg.insert(name.into(), f);
    }
}

/// Evaluates `expr` against `row`'s bindings and `env`'s name resolution.
pub fn eval(expr: &Expr, row: &Row, env: &ExprEnv) -> Result<Value> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),
        Expr::Var(name) => Ok(row.get(name).cloned().unwrap_or(Value::Nil)),
        Expr::App(name, args) => {
            let values: Vec<Value> = args
                .iter()
                .map(|a| eval(a, row, env))
                .collect::<Result<_>>()?;
            apply(name, &values, env)
        }
    }
}

fn apply(name: &str, args: &[Value], env: &ExprEnv) -> Result<Value> {
    if let Some(result) = builtin(name, args) {
        return result;
    }
    if let Some(f) = env.resolve(name) {
        return f(args);
    }
    Err(GraphError::UnsupportedOperation(name.to_string()))
}

fn num(v: &Value) -> Option<f64> {
    v.as_f64()
}

fn numeric_binop(name: &str, args: &[Value], f: impl Fn(f64, f64) -> f64) -> Result<Value> {
    let (Some(a), Some(b)) = (args.first().and_then(num), args.get(1).and_then(num)) else {
        return Err(GraphError::UnsupportedOperation(format!(
            "{name} requires two numeric arguments"
        )));
    };
    let result = f(a, b);
    match (args.first(), args.get(1)) {
        (Some(Value::Int(_)), Some(Value::Int(_))) if result.fract() == 0.0 && name != "/" => {
            Ok(Value::Int(result as i64))
        }
        _ => Ok(Value::Float(OrderedFloat::new(result).unwrap_or(OrderedFloat::new(0.0).unwrap()))),
    }
}

fn compare(args: &[Value], f: impl Fn(std::cmp::Ordering) -> bool) -> Result<Value> {
    let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
        return Err(GraphError::UnsupportedOperation(
            "comparison requires two arguments".to_string(),
        ));
    };
    let ord = a
        .partial_cmp(b)
        .ok_or_else(|| GraphError::UnsupportedOperation("values are not comparable".to_string()))?;
    Ok(Value::Bool(f(ord)))
}

/// The safelist: arithmetic, comparison, and `str`. Anything else must come
/// from the ambient environment or the unsafe-extension escape hatch.
fn builtin(name: &str, args: &[Value]) -> Option<Result<Value>> {
    use std::cmp::Ordering::*;
    Some(match name {
        "+" => numeric_binop("+", args, |a, b| a + b),
        "-" => numeric_binop("-", args, |a, b| a - b),
        "*" => numeric_binop("*", args, |a, b| a * b),
        "/" => numeric_binop("/", args, |a, b| a / b),
        "<" => compare(args, |o| o == Less),
        "<=" => compare(args, |o| o != Greater),
        ">" => compare(args, |o| o == Greater),
        ">=" => compare(args, |o| o != Less),
        "=" => Ok(Value::Bool(args.first() == args.get(1))),
        "not=" => Ok(Value::Bool(args.first() != args.get(1))),
        "str" => Ok(Value::Str(
            args.iter().map(|v| v.to_string()).collect::<String>(),
        )),
        _ => return None,
    })
}
