//! The document value.
//!
//! `Value` mirrors the shape of `serde_json::Value`, but lists and maps are
//! reference counted. Cloning a `Value` is shallow; mutating a container
//! through [`Value::as_array_mut`] / [`Value::as_object_mut`] copies it only
//! if another owner still holds it (copy-on-write). A container that has
//! already been copied within an edit is uniquely owned and is written in
//! place from then on.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

use crate::json_equal::deep_equal;

/// An insertion-ordered map of document values.
pub type Object = IndexMap<String, Value>;

/// An ordered list of document values.
pub type Array = Vec<Value>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Arc<Array>),
    Object(Arc<Object>),
}

impl Value {
    /// An empty map.
    pub fn object() -> Self {
        Value::Object(Arc::new(Object::new()))
    }

    /// An empty list.
    pub fn array() -> Self {
        Value::Array(Arc::new(Array::new()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(Number::as_f64)
    }

    /// Mutable access to a list, copying it first if it is shared.
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(arr) => Some(Arc::make_mut(arr)),
            _ => None,
        }
    }

    /// Mutable access to a map, copying it first if it is shared.
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(map) => Some(Arc::make_mut(map)),
            _ => None,
        }
    }

    /// True when this is a container that a write would have to copy.
    pub fn is_shared(&self) -> bool {
        match self {
            Value::Array(arr) => Arc::strong_count(arr) > 1 || Arc::weak_count(arr) > 0,
            Value::Object(map) => Arc::strong_count(map) > 1 || Arc::weak_count(map) > 0,
            _ => false,
        }
    }

    /// Identity comparison.
    ///
    /// Containers are identical when they are the same allocation; scalars
    /// have no identity and compare by value.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Array(_), _) | (Value::Object(_), _) => false,
            (a, b) => deep_equal(a, b),
        }
    }

    /// Look up a direct child by path step.
    ///
    /// List steps must be canonical indexes; the append marker `-` never
    /// resolves to a value.
    pub fn get_step(&self, step: &str) -> Option<&Value> {
        match self {
            Value::Array(arr) => {
                if !is_index_step(step) {
                    return None;
                }
                arr.get(step.parse::<usize>().ok()?)
            }
            Value::Object(map) => map.get(step),
            _ => None,
        }
    }

    /// Look up a descendant by path.
    pub fn get(&self, path: &[String]) -> Option<&Value> {
        let mut current = self;
        for step in path {
            current = current.get_step(step)?;
        }
        Some(current)
    }

    /// The JSON type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

fn is_index_step(step: &str) -> bool {
    let bytes = step.as_bytes();
    !bytes.is_empty()
        && !(bytes.len() > 1 && bytes[0] == b'0')
        && bytes.iter().all(u8::is_ascii_digit)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(arr: Array) -> Self {
        Value::Array(Arc::new(arr))
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(Arc::new(map))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::from(iter.into_iter().collect::<Array>())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        crate::json_clone::from_json(v)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        crate::json_clone::to_json(v)
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        crate::json_clone::to_json(&v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => serializer.collect_seq(arr.iter()),
            Value::Object(map) => serializer.collect_map(map.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
