//! Inversion of JSON Patch operations.
//!
//! `invert_patch(doc, ops)` returns operations that, applied to
//! `apply_patch(doc, ops)`, give back `doc`. Each operation is inverted
//! against the document exactly as it was before that operation ran.

use thiserror::Error;

use json_sync_pointer::{format_json_pointer, split_last};
use json_sync_util::Value;

use crate::json_patch::{ApplyContext, InvertInput, Op, PatchError, Registry};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvertError {
    #[error("cannot invert unknown operation {0}")]
    UnknownOp(String),
    #[error("cannot resolve {0} against the document")]
    Unresolvable(String),
    #[error(transparent)]
    Apply(#[from] PatchError),
}

/// Invert `ops` with the built-in kinds.
pub fn invert_patch(doc: &Value, ops: &[Op]) -> Result<Vec<Op>, InvertError> {
    invert_patch_with(doc, ops, Registry::builtin())
}

/// Invert `ops` with explicit operation kinds.
///
/// Fails on an unknown kind, on a path whose parent does not exist, and on
/// any operation that does not apply cleanly.
pub fn invert_patch_with(doc: &Value, ops: &[Op], registry: &Registry) -> Result<Vec<Op>, InvertError> {
    let mut ctx = ApplyContext::new(doc, registry);
    let mut groups = Vec::with_capacity(ops.len());
    for op in ops {
        let handler = registry
            .get(&op.op)
            .ok_or_else(|| InvertError::UnknownOp(op.op.clone()))?;
        let parent = match split_last(&op.path) {
            Some((parent, _)) => Some(
                ctx.get(parent)
                    .ok_or_else(|| InvertError::Unresolvable(format_json_pointer(parent)))?,
            ),
            None => None,
        };
        let input = InvertInput {
            op,
            prior: ctx.get(&op.path),
            parent,
            is_index: parent.is_some_and(Value::is_array),
            doc: ctx.root(),
        };
        groups.push(handler.invert(&input)?);
        ctx.apply_op(op)?;
    }
    Ok(groups.into_iter().rev().flatten().collect())
}
