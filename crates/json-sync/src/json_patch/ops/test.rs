use json_sync_pointer::format_json_pointer;

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::TransformContext;

/// `test`: fail unless the value at `path` deep-equals `value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestOp;

impl OpHandler for TestOp {
    fn like(&self) -> OpLike {
        OpLike::Test
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let expected = op.require_value()?;
        let actual = ctx
            .get(&op.path)
            .ok_or_else(|| PatchError::NotFound(format_json_pointer(&op.path)))?;
        if actual != expected {
            return Err(PatchError::Test(op.pointer()));
        }
        Ok(())
    }

    fn invert(&self, _input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        Ok(Vec::new())
    }

    fn transform(&self, _ctx: &TransformContext<'_>, _this: &Op, others: Vec<Op>) -> Vec<Op> {
        others
    }
}

#[cfg(test)]
mod tests {
    use crate::json_patch::{apply_patch_with, ApplyOptions, Op, PatchError, Registry};
    use crate::Value;
    use serde_json::json;

    fn strict(doc: serde_json::Value, op: Op) -> Result<Value, PatchError> {
        apply_patch_with(&Value::from(doc), &[op], &ApplyOptions::strict(), &Registry::default())
    }

    #[test]
    fn test_pass() {
        assert!(strict(json!({"a": 42}), Op::test("/a", 42)).is_ok());
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert!(strict(json!({"a": 42}), Op::test("/a", 42.0)).is_ok());
    }

    #[test]
    fn test_fail() {
        assert_eq!(
            strict(json!({"a": 42}), Op::test("/a", 99)),
            Err(PatchError::Test("/a".into()))
        );
    }

    #[test]
    fn test_missing_path() {
        assert_eq!(
            strict(json!({}), Op::test("/a", 1)),
            Err(PatchError::NotFound("/a".into()))
        );
    }
}
