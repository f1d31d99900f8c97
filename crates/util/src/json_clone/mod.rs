//! Conversions between the document value and `serde_json::Value`, plus
//! deep cloning.
//!
//! [`Value::clone`](crate::Value) is shallow: containers are shared.
//! [`deep_clone`] produces a tree that shares no allocation with its input.

use std::sync::Arc;

use crate::value::{Object, Value};

/// Convert a `serde_json::Value` into a document value.
pub fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::Array(Arc::new(arr.into_iter().map(from_json).collect()))
        }
        serde_json::Value::Object(map) => Value::Object(Arc::new(
            map.into_iter().map(|(k, v)| (k, from_json(v))).collect(),
        )),
    }
}

/// Convert a document value into a `serde_json::Value`.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(arr) => serde_json::Value::Array(arr.iter().map(to_json).collect()),
        Value::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect(),
        ),
    }
}

/// Deep clone a document value. No container of the result is shared with
/// the input.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Array(arr) => Value::Array(Arc::new(arr.iter().map(deep_clone).collect())),
        Value::Object(map) => Value::Object(Arc::new(
            map.iter()
                .map(|(k, v)| (k.clone(), deep_clone(v)))
                .collect::<Object>(),
        )),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let source = json!({"b": [1, {"c": null}], "a": "x", "n": -2.5});
        let value = from_json(source.clone());
        assert_eq!(to_json(&value), source);
    }

    #[test]
    fn test_deep_clone_shares_nothing() {
        let original = from_json(json!({"nested": {"list": [1, 2]}}));
        let copy = deep_clone(&original);
        assert_eq!(copy, original);
        assert!(!copy.ptr_eq(&original));
        let path = vec!["nested".to_string(), "list".to_string()];
        assert!(!copy.get(&path).unwrap().ptr_eq(original.get(&path).unwrap()));
    }
}
