use crate::value::{Object, Value};

/// Check if a map has no own keys.
pub fn is_empty_map(obj: &Object) -> bool {
    obj.is_empty()
}

/// Check if a value is a map with no keys.
///
/// Unlike a plain "has no properties" check, lists and scalars are never
/// considered empty objects.
///
/// ```
/// use serde_json::json;
/// use json_sync_util::{is_empty_object, Value};
///
/// assert!(is_empty_object(&Value::from(json!({}))));
/// assert!(!is_empty_object(&Value::from(json!({"a": 1}))));
/// assert!(!is_empty_object(&Value::from(json!([]))));
/// assert!(!is_empty_object(&Value::Null));
/// ```
pub fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(is_empty_map)
}
