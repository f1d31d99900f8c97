//! Property tests for apply, transform, invert and compose.

use std::collections::BTreeSet;

use json_sync::json_patch::{apply_patch, apply_patch_with, ApplyOptions, Op, Registry};
use json_sync::json_patch_compose::compose_patch;
use json_sync::json_patch_invert::invert_patch;
use json_sync::json_patch_ot::transform_patch;
use json_sync::Value;
use proptest::prelude::*;
use serde_json::json;

const KEYS: [&str; 3] = ["a", "b", "c"];

fn base(len: usize) -> Value {
    let list: Vec<serde_json::Value> = (0..len).map(|i| json!(i)).collect();
    Value::from(json!({"l": list, "m": {"a": 0, "b": 0, "c": 0}, "n": 0}))
}

fn list_len(doc: &Value) -> usize {
    doc.get(&["l".to_string()])
        .and_then(Value::as_array)
        .map_or(0, |l| l.len())
}

/// An edit with positions as fractions of the list, resolved against a
/// concrete document by [`resolve_all`].
#[derive(Clone, Debug)]
enum Edit {
    Insert(f64),
    Remove(f64),
    ReplaceItem(f64),
    ReplaceKey(usize),
    Inc(i64),
    Move(f64, f64),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0.0..1.0f64).prop_map(Edit::Insert),
        (0.0..1.0f64).prop_map(Edit::Remove),
        (0.0..1.0f64).prop_map(Edit::ReplaceItem),
        (0usize..3).prop_map(Edit::ReplaceKey),
        (-5i64..5).prop_map(Edit::Inc),
        (0.0..1.0f64, 0.0..1.0f64).prop_map(|(a, b)| Edit::Move(a, b)),
    ]
}

/// What one side's edits did to the elements and keys of the base document.
///
/// Elements are named by their base index. A gap is the open interval of
/// base elements an inserted (or moved) value landed between, with `-1`
/// and the base length standing for the list ends.
#[derive(Debug, Default)]
struct Footprint {
    written: BTreeSet<usize>,
    removed: BTreeSet<usize>,
    moved: BTreeSet<usize>,
    keys: BTreeSet<usize>,
    gaps: Vec<(i64, i64)>,
}

impl Footprint {
    fn displaced(&self, element: i64) -> bool {
        usize::try_from(element).is_ok_and(|e| self.removed.contains(&e) || self.moved.contains(&e))
    }

    /// True when the two sides wrote the same element or key, or placed
    /// values where their relative order is a tie: the same gap, or a gap
    /// bounded by an element the other side took away.
    fn conflicts(&self, other: &Footprint) -> bool {
        let overlap = |g: &(i64, i64), h: &(i64, i64)| g.0.max(h.0) < g.1.min(h.1);
        !self.written.is_disjoint(&other.written)
            || !self.keys.is_disjoint(&other.keys)
            || self.gaps.iter().any(|g| other.gaps.iter().any(|h| overlap(g, h)))
            || self.gaps.iter().any(|g| other.displaced(g.0) || other.displaced(g.1))
            || other.gaps.iter().any(|h| self.displaced(h.0) || self.displaced(h.1))
    }
}

/// The gap at list index `at`, given which base element sits in each slot.
fn gap_at(shadow: &[Option<usize>], at: usize, len: usize) -> (i64, i64) {
    let left = shadow[..at].iter().rev().flatten().next().map_or(-1, |&e| e as i64);
    let right = shadow[at..].iter().flatten().next().map_or(len as i64, |&e| e as i64);
    (left, right)
}

/// Resolve edits one after another, so each operation is valid on the
/// document the previous ones produced. Written values are unique per side:
/// they start at `fresh`.
fn resolve_all(doc: &Value, edits: &[Edit], fresh: i64) -> (Vec<Op>, Footprint) {
    let base_len = list_len(doc);
    let mut shadow: Vec<Option<usize>> = (0..base_len).map(Some).collect();
    let mut foot = Footprint::default();
    let mut current = doc.clone();
    let mut ops = Vec::new();
    for edit in edits {
        let len = list_len(&current);
        let item = |at: f64| (len > 0).then(|| ((at * (len - 1) as f64) as usize).min(len - 1));
        let tag = fresh + ops.len() as i64;
        let op = match *edit {
            Edit::Insert(at) => {
                let i = ((at * (len + 1) as f64) as usize).min(len);
                foot.gaps.push(gap_at(&shadow, i, base_len));
                shadow.insert(i, None);
                Op::add(&format!("/l/{i}"), tag)
            }
            Edit::Remove(at) => {
                let Some(i) = item(at) else { continue };
                if let Some(e) = shadow.remove(i) {
                    foot.written.insert(e);
                    foot.removed.insert(e);
                }
                Op::remove(&format!("/l/{i}"))
            }
            Edit::ReplaceItem(at) => {
                let Some(i) = item(at) else { continue };
                foot.written.extend(shadow[i]);
                Op::replace(&format!("/l/{i}"), tag + 500)
            }
            Edit::ReplaceKey(k) => {
                foot.keys.insert(k);
                Op::replace(&format!("/m/{}", KEYS[k]), tag)
            }
            Edit::Inc(v) => Op::increment("/n", v),
            Edit::Move(a, b) => {
                let (Some(f), Some(t)) = (item(a), item(b)) else { continue };
                let element = shadow.remove(f);
                if f != t {
                    if let Some(e) = element {
                        foot.written.insert(e);
                        foot.moved.insert(e);
                    }
                    foot.gaps.push(gap_at(&shadow, t, base_len));
                }
                shadow.insert(t, element);
                Op::move_(&format!("/l/{f}"), &format!("/l/{t}"))
            }
        };
        current = apply_patch_with(&current, std::slice::from_ref(&op), &ApplyOptions::strict(), Registry::builtin())
            .unwrap();
        ops.push(op);
    }
    (ops, foot)
}

fn edit_list() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(arb_edit(), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn concurrent_edits_converge(
        len in 0usize..6,
        a in prop::collection::vec(arb_edit(), 1..=4),
        b in prop::collection::vec(arb_edit(), 1..=4),
    ) {
        let doc = base(len);
        let (a, foot_a) = resolve_all(&doc, &a, 1000);
        let (b, foot_b) = resolve_all(&doc, &b, 2000);
        prop_assume!(!foot_a.conflicts(&foot_b));
        let left = apply_patch(&apply_patch(&doc, &a), &transform_patch(&doc, &a, &b));
        let right = apply_patch(&apply_patch(&doc, &b), &transform_patch(&doc, &b, &a));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn invert_undoes(len in 0usize..6, edits in edit_list()) {
        let doc = base(len);
        let (ops, _) = resolve_all(&doc, &edits, 1000);
        let after = apply_patch(&doc, &ops);
        let undo = invert_patch(&doc, &ops).unwrap();
        prop_assert_eq!(apply_patch(&after, &undo), doc);
    }

    #[test]
    fn compose_preserves_effect(len in 0usize..6, edits in edit_list()) {
        let doc = base(len);
        let (ops, _) = resolve_all(&doc, &edits, 1000);
        let composed = compose_patch(&ops);
        prop_assert!(composed.len() <= ops.len());
        prop_assert_eq!(apply_patch(&doc, &composed), apply_patch(&doc, &ops));
    }

    #[test]
    fn apply_never_changes_input(len in 0usize..6, edits in edit_list()) {
        let doc = base(len);
        let snapshot = serde_json::Value::from(&doc);
        let (ops, _) = resolve_all(&doc, &edits, 1000);
        let _ = apply_patch(&doc, &ops);
        prop_assert_eq!(serde_json::Value::from(&doc), snapshot);
        prop_assert!(apply_patch(&doc, &[]).ptr_eq(&doc));
    }
}

#[test]
fn move_against_insert_converges_outside_the_landing_gap() {
    // Every same-list move against every insert, except an insert into the
    // gap the moved value lands in, where the order is a tie.
    let doc = base(5);
    for from in 0..5 {
        for to in (0..5).filter(|&to| to != from) {
            let landing_gap = if from < to { to + 1 } else { to };
            for at in (0..=5).filter(|&at| at != landing_gap) {
                let a = [Op::move_(&format!("/l/{from}"), &format!("/l/{to}"))];
                let b = [Op::add(&format!("/l/{at}"), 100)];
                let left = apply_patch(&apply_patch(&doc, &a), &transform_patch(&doc, &a, &b));
                let right = apply_patch(&apply_patch(&doc, &b), &transform_patch(&doc, &b, &a));
                assert_eq!(left, right, "move {from}->{to} against insert at {at}");
            }
        }
    }
}
