//! An owned, chainable list of operations.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use json_sync_util::Value;

use crate::json_patch_compose::compose_patch;
use crate::json_patch_invert::{invert_patch, InvertError};
use crate::json_patch_ot::transform_patch;

use super::apply::apply_patch;
use super::codec::json::{from_json_patch, to_json_patch};
use super::types::{Op, PatchError};

/// A patch under construction.
///
/// ```
/// use json_sync::json_patch::Patch;
/// use json_sync::Value;
/// use serde_json::json;
///
/// let patch = Patch::new()
///     .add("/tags/-", "new")
///     .increment("/count", 1);
/// let doc = Value::from(json!({"tags": [], "count": 1}));
/// assert_eq!(patch.apply(&doc), Value::from(json!({"tags": ["new"], "count": 2})));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<Op>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(self, path: &str, value: impl Into<Value>) -> Self {
        self.push(Op::add(path, value))
    }

    pub fn remove(self, path: &str) -> Self {
        self.push(Op::remove(path))
    }

    pub fn replace(self, path: &str, value: impl Into<Value>) -> Self {
        self.push(Op::replace(path, value))
    }

    pub fn copy(self, from: &str, path: &str) -> Self {
        self.push(Op::copy(from, path))
    }

    pub fn move_(self, from: &str, path: &str) -> Self {
        self.push(Op::move_(from, path))
    }

    pub fn test(self, path: &str, value: impl Into<Value>) -> Self {
        self.push(Op::test(path, value))
    }

    pub fn increment(self, path: &str, amount: impl Into<Value>) -> Self {
        self.push(Op::increment(path, amount))
    }

    pub fn decrement(self, path: &str, amount: i64) -> Self {
        self.push(Op::decrement(path, amount))
    }

    pub fn custom(self, op: &str, path: &str, value: impl Into<Value>) -> Self {
        self.push(Op::custom(op, path, value))
    }

    pub fn push(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    /// Apply with the built-in kinds, skipping failing operations.
    pub fn apply(&self, doc: &Value) -> Value {
        apply_patch(doc, &self.ops)
    }

    /// Rewrite `other`, authored concurrently against `doc`, to run after
    /// this patch.
    pub fn transform(&self, doc: &Value, other: &Patch) -> Patch {
        Patch::from(transform_patch(doc, &self.ops, &other.ops))
    }

    /// The patch undoing this one, given the document it applies to.
    pub fn invert(&self, doc: &Value) -> Result<Patch, InvertError> {
        invert_patch(doc, &self.ops).map(Patch::from)
    }

    /// An equivalent patch with consecutive mergeable operations folded.
    pub fn compose(&self) -> Patch {
        Patch::from(compose_patch(&self.ops))
    }

    pub fn to_json(&self) -> serde_json::Value {
        to_json_patch(&self.ops)
    }

    pub fn from_json(v: &serde_json::Value) -> Result<Self, PatchError> {
        from_json_patch(v).map(Patch::from)
    }
}

impl From<Vec<Op>> for Patch {
    fn from(ops: Vec<Op>) -> Self {
        Self { ops }
    }
}

impl From<Patch> for Vec<Op> {
    fn from(patch: Patch) -> Self {
        patch.ops
    }
}

impl FromIterator<Op> for Patch {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Patch {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl Deref for Patch {
    type Target = [Op];

    fn deref(&self) -> &[Op] {
        &self.ops
    }
}
