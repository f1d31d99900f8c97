use json_sync_util::{add_numbers, negate_number, Value};

use crate::json_patch::context::{ApplyContext, InvertInput};
use crate::json_patch::registry::OpHandler;
use crate::json_patch::types::{Op, OpLike, PatchError};
use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::TransformContext;

/// `@inc`: add `value` to the number at `path`. A missing map key counts
/// as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncOp;

impl OpHandler for IncOp {
    fn like(&self) -> OpLike {
        OpLike::Replace
    }

    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError> {
        let amount = op
            .require_value()?
            .as_number()
            .ok_or_else(|| PatchError::InvalidValue(format!("@inc at {} expects a number", op.pointer())))?;
        let next = match ctx.get(&op.path) {
            None => amount.clone(),
            Some(Value::Number(current)) => {
                if amount.as_f64() == Some(0.0) {
                    return Ok(());
                }
                add_numbers(current, amount)
                    .ok_or_else(|| PatchError::InvalidValue(format!("@inc overflow at {}", op.pointer())))?
            }
            Some(_) => return Err(PatchError::InvalidTarget(op.pointer())),
        };
        ctx.set(&op.path, Value::Number(next))
    }

    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError> {
        let op = input.op;
        if input.prior.is_none() {
            return Ok(vec![Op::new("remove", op.path.clone())]);
        }
        let negated = op
            .require_value()?
            .as_number()
            .and_then(negate_number)
            .ok_or_else(|| PatchError::InvalidValue(format!("@inc at {} expects a number", op.pointer())))?;
        Ok(vec![Op::new("@inc", op.path.clone()).with_value(Value::Number(negated))])
    }

    fn transform(&self, _ctx: &TransformContext<'_>, _this: &Op, others: Vec<Op>) -> Vec<Op> {
        others
    }

    fn compose(&self, first: &Value, second: &Value) -> Option<Value> {
        add_numbers(first.as_number()?, second.as_number()?).map(Value::Number)
    }

    fn overwrites(&self) -> bool {
        false
    }

    fn commutes(&self) -> bool {
        true
    }
}
