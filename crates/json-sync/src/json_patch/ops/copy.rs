use json_sync_pointer::format_json_pointer;

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::{transform_insert, transform_overwrite, TransformContext, WriteMode};

use super::{map_holds, resolve_append, restore};

/// `copy`: add the value found at `from` to `path`.
///
/// The copied subtree is shared, not cloned; a later write to either
/// location copies the containers it touches.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOp;

impl OpHandler for CopyOp {
    fn like(&self) -> OpLike {
        OpLike::Copy
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let from = op.require_from()?;
        let value = ctx
            .get(from)
            .cloned()
            .ok_or_else(|| PatchError::NotFound(format_json_pointer(from)))?;
        if map_holds(ctx, &op.path, &value) {
            return Ok(());
        }
        ctx.insert(&op.path, value)
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        let op = input.op;
        if input.is_index {
            return Ok(vec![Op::new("remove", resolve_append(&op.path, input.parent))]);
        }
        Ok(vec![restore(&op.path, input.prior)])
    }

    fn transform(&self, ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op> {
        if ctx.is_array_path(&this.path) {
            transform_insert(ctx, &this.path, others)
        } else {
            transform_overwrite(ctx, &this.path, WriteMode::Add, others)
        }
    }
}
