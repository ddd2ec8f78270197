use serde_json::{Map, Value};

use super::condition::{Condition, is_operator_map};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub fn operator(self) -> &'static str {
        match self {
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }
}

/// A single filter operation on one field.
///
/// Constraints are values: folding one into a [`Condition`] consumes the tree and
/// returns the grown tree, leaving the constraint untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Eq(Value),
    Cmp(CmpOp, Value),
    Exists(bool),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    ContainsAll(Vec<Value>),
    SizeIs(u64),
    Matches { pattern: String, options: Option<String> },
    Not(Box<Constraint>),
}

impl Constraint {
    pub fn eq(value: impl Into<Value>) -> Self {
        Self::Eq(value.into())
    }

    pub fn ne(value: impl Into<Value>) -> Self {
        Self::Cmp(CmpOp::Ne, value.into())
    }

    pub fn gt(value: impl Into<Value>) -> Self {
        Self::Cmp(CmpOp::Gt, value.into())
    }

    pub fn gte(value: impl Into<Value>) -> Self {
        Self::Cmp(CmpOp::Gte, value.into())
    }

    pub fn lt(value: impl Into<Value>) -> Self {
        Self::Cmp(CmpOp::Lt, value.into())
    }

    pub fn lte(value: impl Into<Value>) -> Self {
        Self::Cmp(CmpOp::Lte, value.into())
    }

    #[must_use]
    pub fn exists() -> Self {
        Self::Exists(true)
    }

    #[must_use]
    pub fn not_exists() -> Self {
        Self::Exists(false)
    }

    pub fn is_in<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::NotIn(values.into_iter().map(Into::into).collect())
    }

    pub fn contains_all<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::ContainsAll(values.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn size_is(n: u64) -> Self {
        Self::SizeIs(n)
    }

    pub fn matches(pattern: impl Into<String>, options: Option<&str>) -> Self {
        Self::Matches { pattern: pattern.into(), options: options.map(str::to_string) }
    }

    #[cfg(feature = "regex")]
    #[must_use]
    pub fn starts_with(prefix: &str) -> Self {
        Self::matches(format!("^{}", regex::escape(prefix)), None)
    }

    #[cfg(feature = "regex")]
    #[must_use]
    pub fn ends_with(suffix: &str) -> Self {
        Self::matches(format!("{}$", regex::escape(suffix)), None)
    }

    #[cfg(feature = "regex")]
    #[must_use]
    pub fn contains(needle: &str) -> Self {
        Self::matches(regex::escape(needle), None)
    }

    #[must_use]
    pub fn not(inner: Constraint) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Operator form, e.g. `{"$gt": 5}`. Equality uses `$eq`.
    #[must_use]
    pub fn operators(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Self::Eq(v) => {
                map.insert("$eq".into(), v.clone());
            }
            Self::Cmp(op, v) => {
                map.insert(op.operator().into(), v.clone());
            }
            Self::Exists(b) => {
                map.insert("$exists".into(), Value::Bool(*b));
            }
            Self::In(vs) => {
                map.insert("$in".into(), Value::Array(vs.clone()));
            }
            Self::NotIn(vs) => {
                map.insert("$nin".into(), Value::Array(vs.clone()));
            }
            Self::ContainsAll(vs) => {
                map.insert("$all".into(), Value::Array(vs.clone()));
            }
            Self::SizeIs(n) => {
                map.insert("$size".into(), Value::from(*n));
            }
            Self::Matches { pattern, options } => {
                map.insert("$regex".into(), Value::String(pattern.clone()));
                if let Some(o) = options {
                    map.insert("$options".into(), Value::String(o.clone()));
                }
            }
            Self::Not(inner) => {
                map.insert("$not".into(), Value::Object(inner.operators()));
            }
        }
        map
    }

    /// The value stored under the field when it is the only constraint there.
    #[must_use]
    pub fn wire_value(&self) -> Value {
        match self {
            Self::Eq(v) => v.clone(),
            other => Value::Object(other.operators()),
        }
    }

    /// Fold this constraint into `cond` under `key`.
    ///
    /// An operator map already stored for `key` absorbs the new operators when none
    /// of them collide; every other combination keeps both sides under `$and`.
    #[must_use]
    pub fn apply(&self, mut cond: Condition, key: &str) -> Condition {
        match cond.take(key) {
            None => cond.put(key, self.wire_value()),
            Some(Value::Object(mut existing)) if is_operator_map(&existing) => {
                let incoming = self.operators();
                if incoming.keys().any(|k| existing.contains_key(k)) {
                    cond.push_and(key, Value::Object(existing));
                    cond.push_and(key, self.wire_value());
                } else {
                    existing.extend(incoming);
                    cond.put(key, Value::Object(existing));
                }
            }
            Some(existing) => {
                cond.push_and(key, existing);
                cond.push_and(key, self.wire_value());
            }
        }
        cond
    }
}
