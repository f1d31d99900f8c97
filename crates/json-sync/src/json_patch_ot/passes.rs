//! Rewrite passes behind the built-in transform handlers.
//!
//! Every pass walks B in order and keeps an *anchor*: the path of the node
//! A touched, expressed in B's coordinates at the current point of the walk.
//! B's own list inserts and removes shift the anchor, so a B op authored
//! after them is compared against the right index.
//!
//! A move in A relocates B fields before the remove and insert passes run
//! over them; relocated fields carry a flag and are skipped by every later
//! pass. Once B is rewritten, relocated list slots are pointed at where the
//! moved value sits at that point of B.

use std::collections::VecDeque;

use tracing::trace;

use json_sync_pointer::{is_child, is_valid_index, split_last, starts_with, Path, APPEND_STEP};
use json_sync_util::{is_empty_object, Value};

use crate::json_patch::{Op, OpLike, OpTraits};

use super::TransformContext;

/// How A's full-value write reached its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// `add` (or the landing half of a move): a concurrent remove of the
    /// same key still applies afterwards.
    Add,
    /// `replace`: a concurrent remove of the same key is dropped.
    Replace,
}

/// A B operation with per-field relocation marks.
pub(super) struct Pending {
    op: Op,
    path_moved: bool,
    from_moved: bool,
}

impl Pending {
    fn path(&self) -> Option<&Path> {
        (!self.path_moved).then_some(&self.op.path)
    }

    fn from(&self) -> Option<&Path> {
        if self.from_moved {
            None
        } else {
            self.op.from.as_ref()
        }
    }
}

pub(super) fn wrap(ops: Vec<Op>) -> Vec<Pending> {
    ops.into_iter()
        .map(|op| Pending {
            op,
            path_moved: false,
            from_moved: false,
        })
        .collect()
}

pub(super) fn strip(pending: Vec<Pending>) -> Vec<Op> {
    pending.into_iter().map(|p| p.op).collect()
}

// ── Path arithmetic ───────────────────────────────────────────────────────

fn index_of(step: &str) -> Option<usize> {
    if is_valid_index(step) {
        step.parse().ok()
    } else {
        None
    }
}

/// The index `field` addresses in the list at `list`, when it passes
/// through that list by index.
fn slot_in(list: &[String], field: &[String]) -> Option<usize> {
    if field.len() > list.len() && starts_with(field, list) {
        index_of(&field[list.len()])
    } else {
        None
    }
}

fn set_index(field: &mut Path, depth: usize, index: usize) {
    field[depth] = index.to_string();
}

/// Re-express `field`, which lies at or under `old`, under `new`.
fn rebase(field: &mut Path, old: &[String], new: &[String]) {
    let suffix = field.split_off(old.len());
    *field = new.to_vec();
    field.extend(suffix);
}

/// Shift `anchor` after B removed the list slot `slot`.
fn after_removal(ctx: &TransformContext<'_>, slot: &[String], anchor: &mut Path) {
    let Some((list, last)) = split_last(slot) else {
        return;
    };
    if !ctx.is_array_path(slot) {
        return;
    }
    if let (Some(k), Some(i)) = (index_of(last), slot_in(list, anchor)) {
        if k < i {
            set_index(anchor, list.len(), i - 1);
        }
    }
}

/// Shift `anchor` after B inserted at the list slot `slot`. An insert at the
/// anchor's own index lands in front of it.
fn after_insertion(ctx: &TransformContext<'_>, slot: &[String], anchor: &mut Path) {
    let Some((list, last)) = split_last(slot) else {
        return;
    };
    if !ctx.is_array_path(slot) {
        return;
    }
    if let (Some(j), Some(i)) = (index_of(last), slot_in(list, anchor)) {
        if j <= i {
            set_index(anchor, list.len(), i + 1);
        }
    }
}

/// Track the anchor through the path half of B's op (an insertion or a
/// removal at `path`).
fn follow_path(ctx: &TransformContext<'_>, traits: OpTraits, path: &[String], anchor: &mut Path) {
    if traits.removes() {
        after_removal(ctx, path, anchor);
    } else if traits.inserts() {
        after_insertion(ctx, path, anchor);
    }
}

/// True for an op that inserts into a list slot rather than writing a
/// whole value.
fn is_slot_insert(ctx: &TransformContext<'_>, traits: OpTraits, path: &[String]) -> bool {
    traits.inserts() && ctx.is_array_path(path)
}

/// True when B's op replaces or removes `scope` or one of its ancestors
/// (or moves it away), after which B no longer addresses what A changed.
fn supersedes(ctx: &TransformContext<'_>, traits: OpTraits, p: &Pending, scope: &[String]) -> bool {
    let writes = p.path().is_some_and(|path| {
        starts_with(scope, path)
            && (traits.removes() || (traits.overwrites && !is_slot_insert(ctx, traits, path)))
    });
    let takes = traits.moves() && p.from().is_some_and(|from| starts_with(scope, from));
    writes || takes
}

/// What is left of a B op whose target A discarded: a move still takes its
/// value away from the source.
fn vacate(traits: OpTraits, p: Pending) -> Option<Pending> {
    trace!(op = %p.op.op, path = %p.op.pointer(), "dropped by concurrent write");
    if !traits.moves() {
        return None;
    }
    let from = p.op.from?;
    Some(Pending {
        op: Op::new("remove", from),
        path_moved: p.from_moved,
        from_moved: false,
    })
}

/// A copy or move whose source A removed is dropped. The value it would
/// have placed at its path never exists, so the rest of B is rewritten as if
/// that path had been removed.
fn race(ctx: &TransformContext<'_>, p: &Pending, queue: &mut VecDeque<Pending>) {
    trace!(op = %p.op.op, from = ?p.op.from_pointer(), "source removed concurrently");
    let rest = remove(ctx, &p.op.path, queue.drain(..).collect());
    queue.extend(rest);
}

// ── Insert ────────────────────────────────────────────────────────────────

/// A inserted at `slot`, a list path with a concrete index.
pub(super) fn insert(ctx: &TransformContext<'_>, mut slot: Path, others: Vec<Pending>) -> Vec<Pending> {
    let Some(depth) = slot.len().checked_sub(1) else {
        return others;
    };
    let mut queue = VecDeque::from(others);
    let mut out = Vec::with_capacity(queue.len());
    while let Some(mut p) = queue.pop_front() {
        let Some(pivot) = index_of(&slot[depth]) else {
            out.push(p);
            continue;
        };
        let traits = ctx.traits(&p.op);
        let done = supersedes(ctx, traits, &p, &slot[..depth]);

        if let Some(from) = p.from().cloned() {
            if let Some(j) = slot_in(&slot[..depth], &from) {
                if j >= pivot {
                    if let Some(f) = p.op.from.as_mut() {
                        set_index(f, depth, j + 1);
                    }
                }
            }
            if traits.moves() {
                after_removal(ctx, &from, &mut slot);
            }
        }

        if let Some(path) = p.path().cloned() {
            let pivot = index_of(&slot[depth]).unwrap_or(pivot);
            if let Some(j) = slot_in(&slot[..depth], &path) {
                let insertion = traits.inserts() && path.len() == depth + 1;
                if j > pivot || (j == pivot && !insertion) {
                    set_index(&mut p.op.path, depth, j + 1);
                }
            }
            follow_path(ctx, traits, &path, &mut slot);
        }

        out.push(p);
        if done {
            out.extend(queue);
            break;
        }
    }
    out
}

// ── Remove ────────────────────────────────────────────────────────────────

/// A removed `path`: a list element or a map key.
pub(super) fn remove(ctx: &TransformContext<'_>, path: &[String], others: Vec<Pending>) -> Vec<Pending> {
    let Some((_, last)) = split_last(path) else {
        return others;
    };
    if ctx.is_array_path(path) {
        match index_of(last) {
            Some(_) => remove_item(ctx, path.to_vec(), others),
            None => others,
        }
    } else {
        remove_key(ctx, path.to_vec(), others)
    }
}

fn remove_item(ctx: &TransformContext<'_>, mut target: Path, others: Vec<Pending>) -> Vec<Pending> {
    let depth = target.len() - 1;
    let mut queue = VecDeque::from(others);
    let mut out = Vec::with_capacity(queue.len());
    while let Some(mut p) = queue.pop_front() {
        let Some(pivot) = index_of(&target[depth]) else {
            out.push(p);
            continue;
        };
        let traits = ctx.traits(&p.op);
        if traits.removes() && p.path() == Some(&target) {
            trace!(path = %p.op.pointer(), "removed concurrently");
            out.extend(queue);
            break;
        }
        let done = supersedes(ctx, traits, &p, &target[..depth]);

        if let Some(from) = p.from().cloned() {
            match slot_in(&target[..depth], &from) {
                Some(k) if k == pivot => {
                    let same_removal = traits.moves() && from == target;
                    race(ctx, &p, &mut queue);
                    if same_removal {
                        out.extend(queue);
                        break;
                    }
                    continue;
                }
                Some(k) if k > pivot => {
                    if let Some(f) = p.op.from.as_mut() {
                        set_index(f, depth, k - 1);
                    }
                }
                _ => {}
            }
            if traits.moves() {
                after_removal(ctx, &from, &mut target);
            }
        }

        let mut keep = Some(p);
        if let Some(path) = keep.as_ref().and_then(Pending::path).cloned() {
            let pivot = index_of(&target[depth]).unwrap_or(pivot);
            match slot_in(&target[..depth], &path) {
                Some(j) if j > pivot => {
                    if let Some(p) = keep.as_mut() {
                        set_index(&mut p.op.path, depth, j - 1);
                    }
                }
                Some(j) if j == pivot && !(traits.inserts() && path.len() == depth + 1) => {
                    keep = keep.and_then(|p| vacate(traits, p));
                }
                _ => {}
            }
            follow_path(ctx, traits, &path, &mut target);
        }

        out.extend(keep);
        if done {
            out.extend(queue);
            break;
        }
    }
    out
}

fn remove_key(ctx: &TransformContext<'_>, target: Path, others: Vec<Pending>) -> Vec<Pending> {
    let mut target = target;
    let mut queue = VecDeque::from(others);
    let mut out = Vec::with_capacity(queue.len());
    while let Some(p) = queue.pop_front() {
        let traits = ctx.traits(&p.op);
        if traits.removes() && p.path() == Some(&target) {
            trace!(path = %p.op.pointer(), "removed concurrently");
            out.extend(queue);
            break;
        }
        let scope = &target[..target.len().saturating_sub(1)];
        let done = supersedes(ctx, traits, &p, scope);

        if let Some(from) = p.from().cloned() {
            if starts_with(&from, &target) {
                let same_removal = traits.moves() && from == target;
                race(ctx, &p, &mut queue);
                if same_removal {
                    out.extend(queue);
                    break;
                }
                continue;
            }
            if traits.moves() {
                after_removal(ctx, &from, &mut target);
            }
        }

        let mut keep = Some(p);
        if let Some(path) = keep.as_ref().and_then(Pending::path).cloned() {
            if starts_with(&path, &target) && !(traits.commutes && path == target) {
                keep = keep.and_then(|p| vacate(traits, p));
            }
            follow_path(ctx, traits, &path, &mut target);
        }

        out.extend(keep);
        if done {
            out.extend(queue);
            break;
        }
    }
    out
}

// ── Overwrite ─────────────────────────────────────────────────────────────

/// A wrote a whole new value at `target`.
pub(super) fn overwrite(
    ctx: &TransformContext<'_>,
    target: &[String],
    mode: WriteMode,
    others: Vec<Pending>,
) -> Vec<Pending> {
    let mut target = target.to_vec();
    let mut queue = VecDeque::from(others);
    let mut out = Vec::with_capacity(queue.len());
    while let Some(p) = queue.pop_front() {
        let traits = ctx.traits(&p.op);
        let mut done = supersedes(ctx, traits, &p, &target);

        if let Some(from) = p.from().cloned() {
            if is_child(&target, &from) {
                race(ctx, &p, &mut queue);
                continue;
            }
            if traits.moves() {
                after_removal(ctx, &from, &mut target);
            }
        }

        let mut keep = Some(p);
        if let Some(path) = keep.as_ref().and_then(Pending::path).cloned() {
            if is_child(&target, &path) {
                keep = keep.and_then(|p| vacate(traits, p));
            } else if path == target {
                let kept = if is_slot_insert(ctx, traits, &path) || traits.overwrites || traits.commutes {
                    true
                } else if traits.removes() {
                    // A removed list element would leave B's later indices
                    // off by one, so the removal always survives there.
                    mode == WriteMode::Add || ctx.is_array_path(&path)
                } else {
                    false
                };
                if !kept {
                    done = false;
                    keep = keep.and_then(|p| vacate(traits, p));
                }
            }
            follow_path(ctx, traits, &path, &mut target);
        }

        out.extend(keep);
        if done {
            out.extend(queue);
            break;
        }
    }
    out
}

// ── Empty map ─────────────────────────────────────────────────────────────

/// A added `{}` at `target`.
pub(super) fn empty_object(ctx: &TransformContext<'_>, target: &[String], others: Vec<Pending>) -> Vec<Pending> {
    let mut target = target.to_vec();
    let mut out = Vec::with_capacity(others.len());
    for p in others {
        let traits = ctx.traits(&p.op);
        let duplicate = traits.like == Some(OpLike::Add)
            && p.path() == Some(&target)
            && p.op.value.as_ref().is_some_and(is_empty_object);
        if traits.moves() {
            if let Some(from) = p.from() {
                after_removal(ctx, from, &mut target);
            }
        }
        if let Some(path) = p.path() {
            follow_path(ctx, traits, path, &mut target);
        }
        if duplicate {
            trace!(path = %p.op.pointer(), "empty map already added");
        } else {
            out.push(p);
        }
    }
    out
}

// ── Move ──────────────────────────────────────────────────────────────────

/// The landing slot of a move, with a trailing `-` made concrete against
/// the document before the move.
fn landing(ctx: &TransformContext<'_>, from: &[String], to: &[String]) -> Path {
    let mut to = to.to_vec();
    let Some((list, last)) = split_last(&to) else {
        return to;
    };
    if last != APPEND_STEP {
        return to;
    }
    let Some(len) = ctx.doc().get(list).and_then(Value::as_array).map(|l| l.len()) else {
        return to;
    };
    let same_list = split_last(from).is_some_and(|(from_list, _)| from_list == list);
    let index = if same_list { len.saturating_sub(1) } else { len };
    let depth = list.len();
    set_index(&mut to, depth, index);
    to
}

/// A moved the value at `from` to `to`.
pub(super) fn relocate(
    ctx: &TransformContext<'_>,
    from: &[String],
    to: &[String],
    others: Vec<Pending>,
) -> Vec<Pending> {
    if from == to || is_child(from, to) {
        return others;
    }
    let to = landing(ctx, from, to);

    // `source` follows the moved value through B's own list edits. B ops
    // after B itself removed or moved the value are already expressed
    // without it and need no rewriting.
    let from_is_slot = ctx.is_array_path(from);
    let mut source = from.to_vec();
    let mut head = others;
    let mut split = head.len();
    for (i, p) in head.iter_mut().enumerate() {
        let traits = ctx.traits(&p.op);
        let path = p.path().cloned();
        let origin = p.from().cloned();
        let ends = (traits.removes() && path.as_ref() == Some(&source))
            || (traits.moves() && origin.as_ref() == Some(&source));

        if let (Some(origin), Some(field)) = (&origin, p.op.from.as_mut()) {
            if starts_with(origin, &source) {
                rebase(field, &source, &to);
                p.from_moved = true;
            }
        }
        if let Some(path) = &path {
            let insertion_point = from_is_slot && traits.inserts() && path.len() == source.len();
            if starts_with(path, &source) && !insertion_point {
                rebase(&mut p.op.path, &source, &to);
                p.path_moved = true;
            }
        }

        if ends {
            split = i + 1;
            break;
        }
        if traits.moves() {
            if let Some(origin) = &origin {
                after_removal(ctx, origin, &mut source);
            }
        }
        if let Some(path) = &path {
            follow_path(ctx, traits, path, &mut source);
        }
    }
    let tail = head.split_off(split);

    let head = remove(ctx, from, head);
    let to_is_slot = ctx.is_array_path(&to) && split_last(&to).is_some_and(|(_, last)| index_of(last).is_some());
    let mut head = if to_is_slot {
        let mut head = insert(ctx, to.clone(), head);
        land(ctx, &to, &mut head);
        head
    } else {
        overwrite(ctx, &to, WriteMode::Add, head)
    };
    head.extend(tail);
    head
}

/// Point relocated fields at the landing slot as it stands after the B ops
/// before them. `ops` are already rewritten to apply after A.
fn land(ctx: &TransformContext<'_>, to: &[String], ops: &mut [Pending]) {
    let Some(depth) = to.len().checked_sub(1) else {
        return;
    };
    let mut dest = to.to_vec();
    for p in ops.iter_mut() {
        let traits = ctx.traits(&p.op);
        if p.from_moved {
            if let Some(field) = p.op.from.as_mut() {
                field[depth] = dest[depth].clone();
            }
        }
        if p.path_moved {
            p.op.path[depth] = dest[depth].clone();
        }
        if traits.moves() && !p.from_moved {
            if let Some(origin) = &p.op.from {
                after_removal(ctx, origin, &mut dest);
            }
        }
        if !p.path_moved {
            follow_path(ctx, traits, &p.op.path, &mut dest);
        }
    }
}
