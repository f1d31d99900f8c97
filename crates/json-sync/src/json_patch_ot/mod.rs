//! Operational transformation for JSON Patch operations.
//!
//! [`transform_patch`] rewrites a list of operations B so it can be applied
//! after a concurrent list A, where both were authored against the same
//! document. Each operation of A is handed to its kind's handler together
//! with the current B; the handler returns the rewritten B. The built-in
//! handlers are thin wrappers over the passes in this module.
//!
//! Conflicts are resolved in favour of B at a shared slot: two inserts at
//! the same list index leave B's index unchanged, so B's element lands in
//! front of A's, and a full-value write by B at a path A also wrote is kept.
//! Replicas agree by always transforming in the same direction (the
//! server's accepted history is A).

mod passes;

use tracing::{trace, warn};

use json_sync_pointer::{is_list_step, is_valid_index, split_last, APPEND_STEP};
use json_sync_util::Value;

use crate::json_patch::{apply_patch_with, ApplyOptions, Op, OpTraits, Registry};

pub use passes::WriteMode;

use passes::{strip, wrap};

/// Transform state for one [`transform_patch_with`] call.
///
/// Holds the document the two lists were authored against, advanced past
/// each operation of A once B has been rewritten against it, so a later
/// operation of A is classified against the structure it was written for.
pub struct TransformContext<'r> {
    doc: Value,
    registry: &'r Registry,
}

impl<'r> TransformContext<'r> {
    pub fn new(doc: &Value, registry: &'r Registry) -> Self {
        Self {
            doc: doc.clone(),
            registry,
        }
    }

    pub fn doc(&self) -> &Value {
        &self.doc
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn traits(&self, op: &Op) -> OpTraits {
        self.registry.traits(&op.op)
    }

    /// True when `path` addresses a list slot.
    ///
    /// Read from the working document; when the parent cannot be resolved
    /// the last step decides (an index or `-`).
    pub fn is_array_path(&self, path: &[String]) -> bool {
        let Some((parent, last)) = split_last(path) else {
            return false;
        };
        match self.doc.get(parent) {
            Some(Value::Array(_)) => true,
            Some(_) => false,
            None => is_list_step(last),
        }
    }

    /// The concrete index a list path refers to, with `-` resolved to the
    /// list's current length.
    pub fn list_index(&self, path: &[String]) -> Option<usize> {
        let (parent, last) = split_last(path)?;
        if last == APPEND_STEP {
            return self.doc.get(parent).and_then(Value::as_array).map(|l| l.len());
        }
        if is_valid_index(last) {
            return last.parse().ok();
        }
        None
    }

    fn advance(&mut self, op: &Op) {
        let options = ApplyOptions::silent();
        if let Ok(next) = apply_patch_with(&self.doc, std::slice::from_ref(op), &options, self.registry) {
            self.doc = next;
        }
    }
}

/// Transform `other` against `this` with the built-in kinds.
///
/// `doc` is the document both lists were authored against. The result can
/// be applied to `apply_patch(doc, this)`.
pub fn transform_patch(doc: &Value, this: &[Op], other: &[Op]) -> Vec<Op> {
    transform_patch_with(doc, this, other, Registry::builtin())
}

/// Transform `other` against `this` with explicit operation kinds.
///
/// Operations in `this` of an unknown kind are logged and skipped. Moves in
/// `other` whose source is their target change nothing and are dropped.
pub fn transform_patch_with(doc: &Value, this: &[Op], other: &[Op], registry: &Registry) -> Vec<Op> {
    let mut ctx = TransformContext::new(doc, registry);
    let mut others: Vec<Op> = other
        .iter()
        .filter(|op| !(registry.traits(&op.op).moves() && op.from.as_ref() == Some(&op.path)))
        .cloned()
        .collect();
    for op in this {
        match registry.get(&op.op) {
            Some(handler) => {
                others = handler.transform(&ctx, op, others);
                trace!(op = %op.op, path = %op.pointer(), remaining = others.len(), "transformed against");
            }
            None => {
                warn!(op = %op.op, path = %op.pointer(), "cannot transform against unknown operation");
                continue;
            }
        }
        ctx.advance(op);
    }
    others
}

// ── Passes for handlers ───────────────────────────────────────────────────

/// Rewrite `others` against an insertion at the list slot `path`.
pub fn transform_insert(ctx: &TransformContext<'_>, path: &[String], others: Vec<Op>) -> Vec<Op> {
    match (split_last(path), ctx.list_index(path)) {
        (Some((list, _)), Some(pivot)) => {
            let mut slot = list.to_vec();
            slot.push(pivot.to_string());
            strip(passes::insert(ctx, slot, wrap(others)))
        }
        _ => others,
    }
}

/// Rewrite `others` against a removal of `path`, a list slot or a map key.
pub fn transform_remove(ctx: &TransformContext<'_>, path: &[String], others: Vec<Op>) -> Vec<Op> {
    strip(passes::remove(ctx, path, wrap(others)))
}

/// Rewrite `others` against a full-value write at `path`.
pub fn transform_overwrite(
    ctx: &TransformContext<'_>,
    path: &[String],
    mode: WriteMode,
    others: Vec<Op>,
) -> Vec<Op> {
    strip(passes::overwrite(ctx, path, mode, wrap(others)))
}

/// Rewrite `others` against an empty map added at `path`: a concurrent add
/// of an empty map there is the same edit and is dropped, everything else
/// still applies.
pub fn transform_empty_object(ctx: &TransformContext<'_>, path: &[String], others: Vec<Op>) -> Vec<Op> {
    strip(passes::empty_object(ctx, path, wrap(others)))
}

/// Rewrite `others` against a move from `from` to `path`.
pub fn transform_move(
    ctx: &TransformContext<'_>,
    from: &[String],
    path: &[String],
    others: Vec<Op>,
) -> Vec<Op> {
    strip(passes::relocate(ctx, from, path, wrap(others)))
}
