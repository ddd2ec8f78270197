//! Turning raw wire records into result objects.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;

use crate::App;
use crate::errors::QueryError;

/// Converts one raw record of `class_name` into `Output`. Must not depend on query state.
pub trait Decoder: Clone + Send + Sync {
    type Output;

    /// # Errors
    /// Returns `Decode` when the record does not have the expected shape.
    fn decode(&self, app: &App, data: Value, class_name: &str) -> Result<Self::Output, QueryError>;
}

/// Generic object returned when no typed decoder is supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub class_name: String,
    pub object_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub acl: Option<Value>,
    pub data: Map<String, Value>,
}

impl Record {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

fn take_date(map: &mut Map<String, Value>, key: &str) -> Result<Option<DateTime<Utc>>, QueryError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| QueryError::Decode(format!("{key}: {e}"))),
        Some(other) => Err(QueryError::Decode(format!("{key}: expected string, got {other}"))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordDecoder;

impl Decoder for RecordDecoder {
    type Output = Record;

    fn decode(&self, _app: &App, data: Value, class_name: &str) -> Result<Record, QueryError> {
        let Value::Object(mut map) = data else {
            return Err(QueryError::Decode(format!("{class_name}: record is not an object")));
        };
        let object_id = match map.remove("objectId") {
            Some(Value::String(s)) => Some(s),
            None | Some(Value::Null) => None,
            Some(other) => return Err(QueryError::Decode(format!("objectId: unexpected {other}"))),
        };
        let class_name = match map.remove("className") {
            Some(Value::String(s)) => s,
            _ => class_name.to_string(),
        };
        Ok(Record {
            created_at: take_date(&mut map, "createdAt")?,
            updated_at: take_date(&mut map, "updatedAt")?,
            acl: map.remove("ACL"),
            object_id,
            class_name,
            data: map,
        })
    }
}

/// Deserializes each record into `T` with serde.
pub struct SerdeDecoder<T>(PhantomData<fn() -> T>);

impl<T> SerdeDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SerdeDecoder")
    }
}

impl<T: DeserializeOwned> Decoder for SerdeDecoder<T> {
    type Output = T;

    fn decode(&self, _app: &App, data: Value, class_name: &str) -> Result<T, QueryError> {
        serde_json::from_value(data).map_err(|e| QueryError::Decode(format!("{class_name}: {e}")))
    }
}

/// Adapts a plain function or closure.
pub struct FnDecoder<F, T> {
    f: F,
    _out: PhantomData<fn() -> T>,
}

impl<F: Clone, T> Clone for FnDecoder<F, T> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone(), _out: PhantomData }
    }
}

impl<F, T> FnDecoder<F, T>
where
    F: Fn(&App, Value, &str) -> Result<T, QueryError> + Clone + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, _out: PhantomData }
    }
}

impl<F, T> Decoder for FnDecoder<F, T>
where
    F: Fn(&App, Value, &str) -> Result<T, QueryError> + Clone + Send + Sync,
{
    type Output = T;

    fn decode(&self, app: &App, data: Value, class_name: &str) -> Result<T, QueryError> {
        (self.f)(app, data, class_name)
    }
}
