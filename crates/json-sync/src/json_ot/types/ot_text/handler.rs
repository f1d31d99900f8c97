use serde_json::json;

use json_sync_util::Value;

use crate::json_patch::{ApplyContext, InvertInput, Op, OpHandler, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::TransformContext;

use super::{apply, compose, invert, transform, TextComponent, TextDelta, TextError};

/// A patch operation carrying a [`TextDelta`] for the string at its path.
///
/// Not part of the built-in set; register it under a kind name of your
/// choice, conventionally `@text`:
///
/// ```
/// use json_sync::json_ot::ot_text::TextHandler;
/// use json_sync::json_patch::{apply_patch_with, ApplyOptions, Op, Registry};
/// use json_sync::Value;
/// use serde_json::json;
///
/// let registry = Registry::default().with("@text", TextHandler);
/// let op = Op::custom("@text", "/title", json!([{"retain": 5}, {"insert": "!"}]));
/// let doc = Value::from(json!({"title": "hello"}));
/// let out = apply_patch_with(&doc, &[op], &ApplyOptions::strict(), &registry).unwrap();
/// assert_eq!(out, Value::from(json!({"title": "hello!"})));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextHandler;

/// Read a delta from an operation value.
pub fn decode(value: &Value) -> Result<TextDelta, TextError> {
    serde_json::from_value(serde_json::Value::from(value)).map_err(|e| TextError::Malformed(e.to_string()))
}

/// The operation value for a delta.
pub fn encode(delta: &[TextComponent]) -> Value {
    let parts = delta
        .iter()
        .map(|comp| match comp {
            TextComponent::Retain(n) => json!({ "retain": n }),
            TextComponent::Insert(s) => json!({ "insert": s }),
            TextComponent::Delete(n) => json!({ "delete": n }),
        })
        .collect();
    Value::from(serde_json::Value::Array(parts))
}

fn delta_of(op: &Op) -> Result<TextDelta, PatchError> {
    decode(op.require_value()?).map_err(|e| PatchError::InvalidValue(format!("{} at {}: {e}", op.op, op.pointer())))
}

impl OpHandler for TextHandler {
    fn like(&self) -> OpLike {
        OpLike::Replace
    }

    fn overwrites(&self) -> bool {
        false
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let delta = delta_of(op)?;
        let current = match ctx.get(&op.path) {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => return Err(PatchError::InvalidTarget(op.pointer())),
        };
        let next = apply(current.unwrap_or(""), &delta)
            .map_err(|e| PatchError::InvalidValue(format!("{} at {}: {e}", op.op, op.pointer())))?;
        if current == Some(next.as_str()) {
            return Ok(());
        }
        ctx.set(&op.path, Value::String(next))
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        let op = input.op;
        let base = match input.prior {
            None => return Ok(vec![Op::new("remove", op.path.clone())]),
            Some(Value::String(s)) => s,
            Some(_) => return Err(PatchError::InvalidTarget(op.pointer()).into()),
        };
        let delta = delta_of(op)?;
        let undo = invert(&delta, base)
            .map_err(|e| PatchError::InvalidValue(format!("{} at {}: {e}", op.op, op.pointer())))?;
        Ok(vec![Op::new(op.op.clone(), op.path.clone()).with_value(encode(&undo))])
    }

    fn transform(&self, _ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op> {
        let Ok(against) = delta_of(this) else {
            return others;
        };
        others
            .into_iter()
            .map(|other| {
                if other.op != this.op || other.path != this.path {
                    return other;
                }
                match delta_of(&other) {
                    Ok(delta) => {
                        let value = encode(&transform(&delta, &against, false));
                        other.with_value(value)
                    }
                    Err(_) => other,
                }
            })
            .collect()
    }

    fn compose(&self, first: &Value, second: &Value) -> Option<Value> {
        let first = decode(first).ok()?;
        let second = decode(second).ok()?;
        Some(encode(&compose(&first, &second)))
    }
}
