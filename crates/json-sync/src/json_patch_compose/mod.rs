//! Composition of JSON Patch operations.
//!
//! Folds consecutive compatible operations on the same path into one
//! (`replace` + `replace`, `@inc` + `@inc`, and any extension kind whose
//! handler composes values). An operation in between that touches the
//! same path, an ancestor, a descendant, or shifts the same list breaks the
//! chain.

use std::collections::HashMap;

use json_sync_pointer::{is_child, is_list_step, split_last, starts_with, Path};

use crate::json_patch::{Op, OpLike, Registry};

/// Compose `ops` with the built-in kinds.
pub fn compose_patch(ops: &[Op]) -> Vec<Op> {
    compose_patch_with(ops, Registry::builtin())
}

/// Compose `ops` with explicit operation kinds. Applying the result has the
/// same effect as applying `ops`.
pub fn compose_patch_with(ops: &[Op], registry: &Registry) -> Vec<Op> {
    let mut out: Vec<Op> = Vec::with_capacity(ops.len());
    let mut last_at: HashMap<Path, usize> = HashMap::new();
    for op in ops {
        if let Some(&i) = last_at.get(&op.path) {
            let prev = &out[i];
            if prev.op == op.op && prev.from.is_none() && op.from.is_none() {
                let merged = match (registry.get(&op.op), &prev.value, &op.value) {
                    (Some(handler), Some(first), Some(second)) => handler.compose(first, second),
                    _ => None,
                };
                if let Some(value) = merged {
                    out[i].value = Some(value);
                    continue;
                }
            }
        }

        let structural = matches!(
            registry.traits(&op.op).like,
            Some(OpLike::Add | OpLike::Copy | OpLike::Move | OpLike::Remove)
        );
        let touched = std::iter::once(&op.path).chain(op.from.as_ref());
        for path in touched {
            last_at.retain(|tracked, _| !overlaps(tracked, path) && !(structural && shares_list(tracked, path)));
        }
        last_at.insert(op.path.clone(), out.len());
        out.push(op.clone());
    }
    out
}

/// Equal, ancestor or descendant.
fn overlaps(a: &[String], b: &[String]) -> bool {
    starts_with(a, b) || is_child(a, b)
}

/// True when `tracked` lies inside the list `slot` shifts.
fn shares_list(tracked: &[String], slot: &[String]) -> bool {
    match split_last(slot) {
        Some((list, last)) => is_list_step(last) && is_child(list, tracked),
        None => false,
    }
}
