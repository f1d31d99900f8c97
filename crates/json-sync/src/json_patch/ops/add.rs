use json_sync_util::is_empty_object;

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::{
    transform_empty_object, transform_insert, transform_overwrite, TransformContext, WriteMode,
};

use super::{map_holds, resolve_append, restore};

/// `add`: insert into a list, set a map key, or replace the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOp;

impl OpHandler for AddOp {
    fn like(&self) -> OpLike {
        OpLike::Add
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let value = op.require_value()?;
        if map_holds(ctx, &op.path, value) {
            return Ok(());
        }
        ctx.insert(&op.path, value.clone())
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        let op = input.op;
        if input.is_index {
            let path = resolve_append(&op.path, input.parent);
            return Ok(vec![Op::new("remove", path)]);
        }
        Ok(vec![restore(&op.path, input.prior)])
    }

    fn transform(&self, ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op> {
        if ctx.is_array_path(&this.path) {
            transform_insert(ctx, &this.path, others)
        } else if this.value.as_ref().is_some_and(is_empty_object) {
            transform_empty_object(ctx, &this.path, others)
        } else {
            transform_overwrite(ctx, &this.path, WriteMode::Add, others)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::json_patch::{apply_patch, apply_patch_with, ApplyOptions, Op, PatchError, Registry};
    use crate::Value;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    #[test]
    fn add_to_object() {
        let out = apply_patch(&doc(json!({"a": 1})), &[Op::add("/b", 2)]);
        assert_eq!(out, doc(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn add_to_array() {
        let out = apply_patch(&doc(json!([1, 2, 3])), &[Op::add("/1", 99)]);
        assert_eq!(out, doc(json!([1, 99, 2, 3])));
    }

    #[test]
    fn add_append_array() {
        let out = apply_patch(&doc(json!([1, 2])), &[Op::add("/-", 3)]);
        assert_eq!(out, doc(json!([1, 2, 3])));
    }

    #[test]
    fn add_at_root_replaces_document() {
        let out = apply_patch(&doc(json!({"a": 1})), &[Op::add("", json!([1]))]);
        assert_eq!(out, doc(json!([1])));
    }

    #[test]
    fn add_equal_value_keeps_identity() {
        let input = doc(json!({"a": {"b": 1}}));
        let out = apply_patch(&input, &[Op::add("/a", json!({"b": 1}))]);
        assert!(out.ptr_eq(&input));
    }

    #[test]
    fn add_past_end_is_invalid_index() {
        let err = apply_patch_with(
            &doc(json!([1])),
            &[Op::add("/5", 0)],
            &ApplyOptions::strict(),
            &Registry::default(),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::InvalidIndex("/5".into()));
    }
}
