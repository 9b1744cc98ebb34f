//! The value domain: everything that can occupy a subject, predicate, or
//! object position in a triple.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::node::Node;

/// A namespaced symbol (`:a/b` style), used as predicate names and as the
/// materializer's sentinel attributes. Interned as an `Arc<str>` of its
/// canonical `"ns/name"` text so clones are cheap and comparisons are
/// pointer-fast in the common case of repeated predicates.
#[derive(Debug, Clone, Eq)]
pub struct Keyword(Arc<str>);

impl Keyword {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::from(text.into().into_boxed_str()))
    }

    pub fn namespaced(ns: &str, name: &str) -> Self {
        Self::new(format!("{ns}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace before the first `/`, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once('/').map(|(ns, _)| ns)
    }

    /// The name after the first `/`, or the whole text if there is none.
    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, n)| n).unwrap_or(&self.0)
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Hash for Keyword {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl From<&str> for Keyword {
    fn from(s: &str) -> Self {
        Keyword::new(s)
    }
}

/// A total-order wrapper over `f64` so floating-point literals can serve as
/// `HashMap` keys at every index level. Construction rejects `NaN`.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(f64);

impl OrderedFloat {
    pub fn new(v: f64) -> Option<Self> {
        if v.is_nan() {
            None
        } else {
            Some(Self(v))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}
impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}

impl fmt::Display for OrderedFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Any value that may occupy a subject, predicate, or object position.
///
/// Predicates are ordinary values: the type does not distinguish "this is a
/// predicate slot" from "this is a subject slot" beyond where it sits in a
/// [`crate::triple::Triple`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Node(Node),
    Str(String),
    Int(i64),
    Float(OrderedFloat),
    Bool(bool),
    Timestamp(UtcInstant),
    Keyword(Keyword),
    Nil,
    /// An ephemeral tuple produced by a `Bind` expression for destructuring
    /// (`[(my-fn ?x) [?a ?b]]`). Never stored in a triple position.
    Tuple(Vec<Value>),
}

/// Wraps `OffsetDateTime` with an `Eq`/`Hash` impl based on its Unix
/// nanosecond instant, so timestamps can serve as index keys.
#[derive(Debug, Clone, Copy)]
pub struct UtcInstant(pub OffsetDateTime);

impl PartialEq for UtcInstant {
    fn eq(&self, other: &Self) -> bool {
        self.0.unix_timestamp_nanos() == other.0.unix_timestamp_nanos()
    }
}
impl Eq for UtcInstant {}

impl Hash for UtcInstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unix_timestamp_nanos().hash(state)
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Value::Node(n)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Value::Keyword(k)
    }
}

impl Value {
    pub fn as_node(&self) -> Option<Node> {
        match self {
            Value::Node(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&Keyword> {
        match self {
            Value::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(f.get()),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Node(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(t) => write!(f, "{}", t.0),
            Value::Keyword(k) => write!(f, "{k}"),
            Value::Nil => write!(f, "nil"),
            Value::Tuple(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Partial order over values used by `min`/`max` aggregates and
/// `<`/`<=`/`>`/`>=` comparison operators. Values of mismatched kinds are
/// incomparable.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.get().partial_cmp(&b.get()),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(&b.get()),
            (Value::Float(a), Value::Int(b)) => a.get().partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => {
                a.0.unix_timestamp_nanos().partial_cmp(&b.0.unix_timestamp_nanos())
            }
            _ => None,
        }
    }
}

/// `Value`'s rank among mismatched kinds, used only to give [`Ord`] a total
/// order when [`PartialOrd::partial_cmp`] returns `None`. Arbitrary but
/// stable within a process.
fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::Float(_) => 3,
        Value::Str(_) => 4,
        Value::Keyword(_) => 5,
        Value::Node(_) => 6,
        Value::Timestamp(_) => 7,
        Value::Tuple(_) => 8,
    }
}

/// A total order over `Value`, used where a deterministic ordering is
/// needed regardless of comparability (e.g. the entity materializer's
/// `BTreeSet<Value>` collapse of same-attribute multiplicity). Agrees with
/// [`PartialOrd::partial_cmp`] whenever that returns `Some`; same-kind pairs
/// that `partial_cmp` can't order (e.g. two `Node`s) fall back to a
/// kind-specific secondary key so distinct values never compare equal.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if let Some(ord) = self.partial_cmp(other) {
            return ord;
        }
        match (self, other) {
            (Value::Node(a), Value::Node(b)) => a.cmp(b),
            (Value::Keyword(a), Value::Keyword(b)) => a.as_str().cmp(b.as_str()),
            (Value::Nil, Value::Nil) => std::cmp::Ordering::Equal,
            (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
            _ => kind_rank(self).cmp(&kind_rank(other)),
        }
    }
}

/// Plain, derive-friendly mirror of [`Value`] used only for JSON
/// (de)serialization — `Value`'s own variants wrap non-serde-derivable
/// internals (`Arc<str>`, a NaN-rejecting float, `OffsetDateTime`), so
/// conversion goes through this shape instead of deriving directly on it.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ValueRepr {
    Node(u64),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    TimestampNanos(i128),
    Keyword(String),
    Nil,
    Tuple(Vec<Value>),
}

impl From<&Value> for ValueRepr {
    fn from(v: &Value) -> Self {
        match v {
            Value::Node(n) => ValueRepr::Node(n.raw()),
            Value::Str(s) => ValueRepr::Str(s.clone()),
            Value::Int(i) => ValueRepr::Int(*i),
            Value::Float(f) => ValueRepr::Float(f.get()),
            Value::Bool(b) => ValueRepr::Bool(*b),
            Value::Timestamp(t) => ValueRepr::TimestampNanos(t.0.unix_timestamp_nanos()),
            Value::Keyword(k) => ValueRepr::Keyword(k.as_str().to_string()),
            Value::Nil => ValueRepr::Nil,
            Value::Tuple(items) => ValueRepr::Tuple(items.clone()),
        }
    }
}

impl TryFrom<ValueRepr> for Value {
    type Error = String;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        Ok(match repr {
            ValueRepr::Node(raw) => Value::Node(Node::from_raw(raw)),
            ValueRepr::Str(s) => Value::Str(s),
            ValueRepr::Int(i) => Value::Int(i),
            ValueRepr::Float(f) => {
                Value::Float(OrderedFloat::new(f).ok_or_else(|| "NaN float literal".to_string())?)
            }
            ValueRepr::Bool(b) => Value::Bool(b),
            ValueRepr::TimestampNanos(nanos) => Value::Timestamp(UtcInstant(
                OffsetDateTime::from_unix_timestamp_nanos(nanos)
                    .map_err(|e| e.to_string())?,
            )),
            ValueRepr::Keyword(s) => Value::Keyword(Keyword::new(s)),
            ValueRepr::Nil => Value::Nil,
            ValueRepr::Tuple(items) => Value::Tuple(items),
        })
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ValueRepr::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = ValueRepr::deserialize(deserializer)?;
        Value::try_from(repr).map_err(serde::de::Error::custom)
    }
}
