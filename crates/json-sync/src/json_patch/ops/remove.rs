use json_sync_pointer::format_json_pointer;

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::{transform_remove, TransformContext};

/// `remove`: delete a list element or an existing map key.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOp;

impl OpHandler for RemoveOp {
    fn like(&self) -> OpLike {
        OpLike::Remove
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        ctx.remove(&op.path).map(drop)
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        let op = input.op;
        let prior = input
            .prior
            .ok_or_else(|| InvertError::Unresolvable(format_json_pointer(&op.path)))?;
        Ok(vec![Op::new("add", op.path.clone()).with_value(prior.clone())])
    }

    fn transform(&self, ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op> {
        transform_remove(ctx, &this.path, others)
    }
}

#[cfg(test)]
mod tests {
    use crate::json_patch::{apply_patch, apply_patch_with, ApplyOptions, Op, PatchError, Registry};
    use crate::Value;
    use serde_json::json;

    #[test]
    fn remove_from_object_keeps_key_order() {
        let out = apply_patch(&Value::from(json!({"a": 1, "b": 2, "c": 3})), &[Op::remove("/b")]);
        assert_eq!(out.to_string(), r#"{"a":1,"c":3}"#);
    }

    #[test]
    fn remove_from_array() {
        let out = apply_patch(&Value::from(json!([1, 2, 3])), &[Op::remove("/0")]);
        assert_eq!(out, Value::from(json!([2, 3])));
    }

    #[test]
    fn remove_missing_key_is_not_found() {
        let err = apply_patch_with(
            &Value::from(json!({"a": 1})),
            &[Op::remove("/z")],
            &ApplyOptions::strict(),
            &Registry::default(),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::NotFound("/z".into()));
    }

    #[test]
    fn remove_missing_key_leniently_keeps_identity() {
        let input = Value::from(json!({"a": {"b": 1}}));
        let out = apply_patch(&input, &[Op::remove("/a/z")]);
        assert!(out.ptr_eq(&input));
    }
}
