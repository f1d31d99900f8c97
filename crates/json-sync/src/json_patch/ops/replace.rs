use json_sync_util::Value;

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::{transform_overwrite, TransformContext, WriteMode};

use super::restore;

/// `replace`: overwrite a list element, or set a map key whether or not it
/// exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceOp;

impl OpHandler for ReplaceOp {
    fn like(&self) -> OpLike {
        OpLike::Replace
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let value = op.require_value()?;
        if ctx.get(&op.path).is_some_and(|current| current == value) {
            return Ok(());
        }
        ctx.set(&op.path, value.clone())
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        Ok(vec![restore(&input.op.path, input.prior)])
    }

    fn transform(&self, ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op> {
        transform_overwrite(ctx, &this.path, WriteMode::Replace, others)
    }

    fn compose(&self, _first: &Value, second: &Value) -> Option<Value> {
        Some(second.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::json_patch::{apply_patch, apply_patch_with, ApplyOptions, Op, PatchError, Registry};
    use crate::Value;
    use serde_json::json;

    #[test]
    fn replace_value() {
        let out = apply_patch(&Value::from(json!({"a": 1})), &[Op::replace("/a", 99)]);
        assert_eq!(out, Value::from(json!({"a": 99})));
    }

    #[test]
    fn replace_creates_missing_key() {
        let out = apply_patch(&Value::from(json!({})), &[Op::replace("/a", true)]);
        assert_eq!(out, Value::from(json!({"a": true})));
    }

    #[test]
    fn replace_list_element_must_exist() {
        let err = apply_patch_with(
            &Value::from(json!([0])),
            &[Op::replace("/1", 1)],
            &ApplyOptions::strict(),
            &Registry::default(),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::NotFound("/1".into()));
    }

    #[test]
    fn replace_with_equal_value_is_a_no_op() {
        let input = Value::from(json!({"x": {"deep": [1, 2]}, "y": 1}));
        let out = apply_patch(&input, &[Op::replace("/x", json!({"deep": [1, 2]}))]);
        assert!(out.ptr_eq(&input));
    }

    #[test]
    fn replace_without_value_is_rejected() {
        let err = apply_patch_with(
            &Value::from(json!({})),
            &[Op::new("replace", vec!["a".into()])],
            &ApplyOptions::strict(),
            &Registry::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::MissingValue { .. }));
    }
}
