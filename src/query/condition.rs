use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key holding the branches of a logical OR.
pub const OR_KEY: &str = "$or";
/// Reserved key holding same-field constraints that could not share one operator map.
pub const AND_KEY: &str = "$and";

/// Accumulated filter state, serialized as the `where` wire parameter.
///
/// Keys are field names, except for the reserved combinator keys [`OR_KEY`] and
/// [`AND_KEY`]. An empty tree means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(Map<String, Value>);

impl Condition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Combine branches under the OR combinator, in order.
    #[must_use]
    pub fn any_of(branches: Vec<Condition>) -> Self {
        let mut map = Map::new();
        map.insert(
            OR_KEY.to_string(),
            Value::Array(branches.into_iter().map(Condition::into_value).collect()),
        );
        Self(map)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub(crate) fn take(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub(crate) fn put(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Append `{key: value}` to the `$and` list, creating it when missing.
    pub(crate) fn push_and(&mut self, key: &str, value: Value) {
        let mut clause = Map::new();
        clause.insert(key.to_string(), value);
        match self.0.get_mut(AND_KEY) {
            Some(Value::Array(items)) => items.push(Value::Object(clause)),
            Some(other) => {
                let prev = other.take();
                *other = Value::Array(vec![prev, Value::Object(clause)]);
            }
            None => {
                self.0.insert(AND_KEY.to_string(), Value::Array(vec![Value::Object(clause)]));
            }
        }
    }
}

impl From<Map<String, Value>> for Condition {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Condition> for Value {
    fn from(cond: Condition) -> Self {
        cond.into_value()
    }
}

/// An object whose keys are all `$`-prefixed operators.
pub(crate) fn is_operator_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}
