//! JSON Patch apply logic.

use tracing::{trace, warn};

use json_sync_pointer::parse_json_pointer;
use json_sync_util::Value;

use super::context::ApplyContext;
use super::registry::Registry;
use super::types::{ApplyOptions, Op, PatchError};

/// Apply `ops` with the built-in kinds, skipping (and logging) operations
/// that fail.
///
/// The input is never modified. Subtrees no operation wrote to are shared
/// with the result, and a patch that changes nothing returns `doc` itself.
pub fn apply_patch(doc: &Value, ops: &[Op]) -> Value {
    apply_patch_with(doc, ops, &ApplyOptions::default(), Registry::builtin())
        .unwrap_or_else(|_| doc.clone())
}

/// Apply `ops` with explicit options and operation kinds.
///
/// With `strict`, the first failing operation's error is returned. Otherwise
/// failures are logged (unless `silent`) and the operation is skipped;
/// `rigid` stops at the first failure and returns the original document,
/// or the document as applied so far when `partial` is also set.
pub fn apply_patch_with(
    doc: &Value,
    ops: &[Op],
    options: &ApplyOptions,
    registry: &Registry,
) -> Result<Value, PatchError> {
    let prefix = options.at_path.as_deref().map(parse_json_pointer);
    let mut ctx =
        ApplyContext::new(doc, registry).create_missing_objects(options.create_missing_objects);

    for op in ops {
        let scoped;
        let op = match &prefix {
            Some(prefix) => {
                scoped = op.prefixed(prefix);
                &scoped
            }
            None => op,
        };
        let before = ctx.root().clone();
        if let Err(err) = ctx.apply_op(op) {
            // A failing op may have written part of its effect already.
            ctx.set_root(before);
            if options.strict {
                return Err(err);
            }
            if !options.silent {
                warn!(op = %op.op, path = %op.pointer(), error = %err, "skipping operation");
            }
            if options.rigid {
                return Ok(if options.partial {
                    ctx.into_root()
                } else {
                    doc.clone()
                });
            }
        }
    }

    trace!(ops = ops.len(), copies = ctx.copies(), "patch applied");
    Ok(ctx.into_root())
}
