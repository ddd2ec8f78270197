use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::condition::Condition;
use super::constraint::Constraint;
use crate::errors::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Order {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(QueryError::invalid(format!("unknown order direction: {other}"))),
        }
    }
}

/// Right-hand side of one `field => ...` entry in a where map.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Skipped entirely; nothing is recorded for the field.
    Undefined,
    /// A bare value, folded as equality.
    Value(Value),
    Constraint(Constraint),
}

impl Term {
    pub(crate) fn into_constraint(self) -> Option<Constraint> {
        match self {
            Self::Undefined => None,
            Self::Value(v) => Some(Constraint::Eq(v)),
            Self::Constraint(c) => Some(c),
        }
    }
}

impl From<Constraint> for Term {
    fn from(c: Constraint) -> Self {
        Self::Constraint(c)
    }
}

impl<T: Into<Term>> From<Option<T>> for Term {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Undefined, Into::into)
    }
}

macro_rules! term_from_value {
    ($($t:ty),* $(,)?) => {
        $(impl From<$t> for Term {
            fn from(v: $t) -> Self {
                Self::Value(Value::from(v))
            }
        })*
    };
}

term_from_value!(Value, &str, String, bool, i32, i64, u32, u64, f64, Vec<Value>);

/// Ordered field => term entries; the object form of a where argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintMap {
    entries: Vec<(String, Term)>,
}

impl ConstraintMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, term: impl Into<Term>) -> Self {
        self.entries.push((key.into(), term.into()));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when at least one entry would record a constraint.
    #[must_use]
    pub fn has_defined_terms(&self) -> bool {
        self.entries.iter().any(|(_, t)| !matches!(t, Term::Undefined))
    }

    /// Fold every defined entry, left to right, into `base`.
    #[must_use]
    pub fn fold_into(self, base: Condition) -> Condition {
        self.entries.into_iter().fold(base, |acc, (key, term)| match term.into_constraint() {
            Some(c) => c.apply(acc, &key),
            None => acc,
        })
    }
}

impl<K: Into<String>, T: Into<Term>> FromIterator<(K, T)> for ConstraintMap {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, t)| (k.into(), t.into())).collect() }
    }
}

/// The accepted shapes of a `where` call.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereArg {
    /// All entries ANDed into the current condition.
    Fields(ConstraintMap),
    /// Each map folded separately from the current condition, then ORed.
    AnyOf(Vec<ConstraintMap>),
    /// `key`, a registered command name and its arguments.
    Command { key: String, command: String, args: Vec<Value> },
    /// Untyped input, parsed into one of the shapes above.
    Json(Value),
}

impl From<ConstraintMap> for WhereArg {
    fn from(m: ConstraintMap) -> Self {
        Self::Fields(m)
    }
}

impl From<Vec<ConstraintMap>> for WhereArg {
    fn from(ms: Vec<ConstraintMap>) -> Self {
        Self::AnyOf(ms)
    }
}

impl From<Value> for WhereArg {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

/// Canonical wire parameters. `None` fields are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryParams {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,
    #[serde(rename = "returnACL", skip_serializing_if = "Option::is_none")]
    pub return_acl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CountResponse {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScanResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub cursor: Option<String>,
}
