//! Built-in operation handlers.

mod add;
mod copy;
mod increment;
mod move_op;
mod remove;
mod replace;
mod test;

pub use add::AddOp;
pub use copy::CopyOp;
pub use increment::IncOp;
pub use move_op::MoveOp;
pub use remove::RemoveOp;
pub use replace::ReplaceOp;
pub use test::TestOp;

use json_sync_pointer::{split_last, Path, APPEND_STEP};
use json_sync_util::Value;

use super::context::ApplyContext;
use super::types::Op;

/// True when `path` names a map key that already holds `value`.
fn map_holds(ctx: &ApplyContext<'_>, path: &[String], value: &Value) -> bool {
    match split_last(path) {
        Some((parent, key)) => ctx
            .get(parent)
            .and_then(Value::as_object)
            .and_then(|map| map.get(key))
            .is_some_and(|current| current == value),
        None => ctx.root() == value,
    }
}

/// Replace a trailing `-` with the concrete index it appended at, given the
/// list as it was before the append.
fn resolve_append(path: &[String], list: Option<&Value>) -> Path {
    let mut resolved = path.to_vec();
    if let (Some(last), Some(items)) = (resolved.last_mut(), list.and_then(Value::as_array)) {
        if last == APPEND_STEP {
            *last = items.len().to_string();
        }
    }
    resolved
}

/// The operation restoring `path` to `prior`: a replace with the old value,
/// or a remove when there was none.
fn restore(path: &[String], prior: Option<&Value>) -> Op {
    match prior {
        Some(value) => Op::new("replace", path.to_vec()).with_value(value.clone()),
        None => Op::new("remove", path.to_vec()),
    }
}
