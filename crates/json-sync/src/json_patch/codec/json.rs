//! JSON codec for operations.
//!
//! The wire form of an operation is an object
//! `{"op": kind, "path": pointer, "value"?: any, "from"?: pointer}`;
//! a patch is an array of those.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use json_sync_pointer::{format_json_pointer, parse_json_pointer, validate_json_pointer, Path};
use json_sync_util::Value;

use crate::json_patch::types::{Op, PatchError};

// ── Path helpers ──────────────────────────────────────────────────────────

fn decode_path(field: &str, v: &JsonValue) -> Result<Path, PatchError> {
    let s = v
        .as_str()
        .ok_or_else(|| PatchError::InvalidOp(format!("{field} must be a string")))?;
    validate_json_pointer(s)
        .map_err(|e| PatchError::InvalidOp(format!("invalid {field} {s:?}: {e}")))?;
    Ok(parse_json_pointer(s))
}

fn takes_from(kind: &str) -> bool {
    matches!(kind, "copy" | "move")
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Serialize an `Op` to its wire object.
pub fn to_json(op: &Op) -> JsonValue {
    let mut m = Map::new();
    m.insert("op".into(), JsonValue::String(op.op.clone()));
    m.insert("path".into(), JsonValue::String(format_json_pointer(&op.path)));
    if let Some(from) = &op.from {
        m.insert("from".into(), JsonValue::String(format_json_pointer(from)));
    }
    if let Some(value) = &op.value {
        m.insert("value".into(), JsonValue::from(value));
    }
    JsonValue::Object(m)
}

/// Serialize a list of operations to a JSON array.
pub fn to_json_patch(ops: &[Op]) -> JsonValue {
    JsonValue::Array(ops.iter().map(to_json).collect())
}

// ── Deserialization ───────────────────────────────────────────────────────

/// Deserialize one operation.
///
/// Pointer syntax is validated; `from` is required for `copy` and `move`
/// and rejected for every other kind. Whether a kind needs a `value` is
/// checked when the operation is applied.
pub fn from_json(v: &JsonValue) -> Result<Op, PatchError> {
    let obj = v
        .as_object()
        .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
    let kind = obj
        .get("op")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PatchError::InvalidOp("missing 'op' field".into()))?;
    let path = decode_path(
        "path",
        obj.get("path")
            .ok_or_else(|| PatchError::InvalidOp(format!("{kind} requires 'path'")))?,
    )?;

    let from = match obj.get("from") {
        Some(from) if takes_from(kind) => Some(decode_path("from", from)?),
        Some(_) => {
            return Err(PatchError::InvalidOp(format!("{kind} does not take 'from'")));
        }
        None if takes_from(kind) => {
            return Err(PatchError::InvalidOp(format!("{kind} requires 'from'")));
        }
        None => None,
    };

    Ok(Op {
        op: kind.to_string(),
        path,
        from,
        value: obj.get("value").cloned().map(Value::from),
    })
}

/// Deserialize a JSON array into a list of operations.
pub fn from_json_patch(v: &JsonValue) -> Result<Vec<Op>, PatchError> {
    let arr = v
        .as_array()
        .ok_or_else(|| PatchError::InvalidOp("patch must be an array".into()))?;
    arr.iter().map(from_json).collect()
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Op {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        from_json(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_only_present_fields() {
        assert_eq!(to_json(&Op::remove("/a/0")), json!({"op": "remove", "path": "/a/0"}));
        assert_eq!(
            to_json(&Op::move_("/x", "/y~1z")),
            json!({"op": "move", "path": "/y~1z", "from": "/x"})
        );
        assert_eq!(
            to_json(&Op::increment("/n", 2)),
            json!({"op": "@inc", "path": "/n", "value": 2})
        );
    }

    #[test]
    fn decodes_patch() {
        let ops = from_json_patch(&json!([
            {"op": "add", "path": "/tags/0", "value": "foo"},
            {"op": "copy", "from": "/a", "path": "/b"},
            {"op": "@text", "path": "/s", "value": [{"retain": 1}, {"insert": "x"}]}
        ]))
        .unwrap();
        assert_eq!(ops[0], Op::add("/tags/0", "foo"));
        assert_eq!(ops[1], Op::copy("/a", "/b"));
        assert_eq!(ops[2].op, "@text");
    }

    #[test]
    fn from_is_required_for_copy_and_move() {
        let err = from_json(&json!({"op": "move", "path": "/a"})).unwrap_err();
        assert_eq!(err, PatchError::InvalidOp("move requires 'from'".into()));
    }

    #[test]
    fn from_is_rejected_elsewhere() {
        let err = from_json(&json!({"op": "add", "path": "/a", "from": "/b", "value": 1})).unwrap_err();
        assert_eq!(err, PatchError::InvalidOp("add does not take 'from'".into()));
    }

    #[test]
    fn relative_pointer_is_rejected() {
        assert!(from_json(&json!({"op": "remove", "path": "a/b"})).is_err());
        assert!(from_json(&json!({"op": "remove"})).is_err());
        assert!(from_json(&json!("remove")).is_err());
    }

    #[test]
    fn serde_goes_through_wire_form() {
        let op: Op = serde_json::from_str(r#"{"op":"replace","path":"/k","value":{"z":1,"a":2}}"#).unwrap();
        assert_eq!(op, Op::replace("/k", json!({"z": 1, "a": 2})));
        assert_eq!(
            serde_json::to_string(&op).unwrap(),
            r#"{"op":"replace","path":"/k","value":{"z":1,"a":2}}"#
        );
    }
}
