use crate::number::numbers_equal;
use crate::value::Value;

/// Performs a deep equality check between two document values.
///
/// Identical containers are equal without being walked. Numbers compare by
/// numeric value, so `1` equals `1.0`. Map key order is ignored.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use json_sync_util::{deep_equal, Value};
///
/// let a = Value::from(json!({"foo": [1, 2, 3]}));
/// let b = Value::from(json!({"foo": [1, 2, 3]}));
/// let c = Value::from(json!({"foo": [1, 2, 4]}));
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,

        // Arrays
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            if std::sync::Arc::ptr_eq(arr_a, arr_b) {
                return true;
            }
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b.iter()).all(|(x, y)| deep_equal(x, y))
        }

        // Objects
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if std::sync::Arc::ptr_eq(obj_a, obj_b) {
                return true;
            }
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a.iter().all(|(key, val_a)| match obj_b.get(key) {
                Some(val_b) => deep_equal(val_a, val_b),
                None => false,
            })
        }

        // Different types are never equal
        _ => false,
    }
}
