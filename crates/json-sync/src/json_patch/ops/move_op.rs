use json_sync_pointer::{is_child, split_last, APPEND_STEP};

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::{transform_move, TransformContext};

/// `move`: remove the value at `from` and add it at `path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveOp;

impl OpHandler for MoveOp {
    fn like(&self) -> OpLike {
        OpLike::Move
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let from = op.require_from()?;
        if *from == op.path {
            return Ok(());
        }
        if is_child(from, &op.path) {
            return Err(PatchError::InvalidTarget(op.pointer()));
        }
        let value = ctx.remove(from)?;
        ctx.insert(&op.path, value)
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        let op = input.op;
        let from = op.require_from()?;
        if *from == op.path {
            return Ok(Vec::new());
        }
        // Where the value landed. An append lands after the last element,
        // which is one slot earlier when the value came out of the same list.
        let mut landed = op.path.clone();
        if let (Some((parent, _)), Some(last), Some(items)) = (
            split_last(&op.path),
            landed.last_mut(),
            input.parent.and_then(|p| p.as_array()),
        ) {
            if last == APPEND_STEP {
                let same_list = split_last(from).is_some_and(|(from_parent, _)| from_parent == parent);
                let len = if same_list { items.len().saturating_sub(1) } else { items.len() };
                *last = len.to_string();
            }
        }
        let mut ops = vec![Op::new("move", from.clone()).with_from(landed.clone())];
        if !input.is_index {
            if let Some(prior) = input.prior {
                ops.push(Op::new("add", landed).with_value(prior.clone()));
            }
        }
        Ok(ops)
    }

    fn transform(&self, ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op> {
        match &this.from {
            Some(from) if *from != this.path => transform_move(ctx, from, &this.path, others),
            _ => others,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::json_patch::{apply_patch, apply_patch_with, ApplyOptions, Op, PatchError, Registry};
    use crate::Value;
    use serde_json::json;

    #[test]
    fn move_between_keys() {
        let out = apply_patch(&Value::from(json!({"a": 1, "b": 2})), &[Op::move_("/a", "/c")]);
        assert_eq!(out, Value::from(json!({"b": 2, "c": 1})));
    }

    #[test]
    fn move_to_end_of_other_list() {
        let input = Value::from(json!({"matrix": [[0, 1, 2], [3, 4, 5], [6, 7, 8]]}));
        let out = apply_patch(&input, &[Op::move_("/matrix/2/0", "/matrix/1/-")]);
        assert_eq!(out, Value::from(json!({"matrix": [[0, 1, 2], [3, 4, 5, 6], [7, 8]]})));
        // the untouched row keeps its identity
        let row = |v: &Value| v.get(&["matrix".into(), "0".into()]).cloned().unwrap();
        assert!(row(&out).ptr_eq(&row(&input)));
    }

    #[test]
    fn move_onto_itself_is_a_no_op() {
        let input = Value::from(json!({"a": [1]}));
        let out = apply_patch(&input, &[Op::move_("/a", "/a")]);
        assert!(out.ptr_eq(&input));
    }

    #[test]
    fn move_into_own_child_is_invalid() {
        let err = apply_patch_with(
            &Value::from(json!({"a": {"b": {}}})),
            &[Op::move_("/a", "/a/b/c")],
            &ApplyOptions::strict(),
            &Registry::default(),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::InvalidTarget("/a/b/c".into()));
    }
}
