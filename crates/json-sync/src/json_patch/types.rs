//! Core types for the JSON Patch module.

use serde::Deserialize;
use thiserror::Error;

use json_sync_pointer::{format_json_pointer, parse_json_pointer};
use json_sync_util::Value;

pub use json_sync_pointer::Path;

// ── Error ─────────────────────────────────────────────────────────────────

/// A failure to apply one operation. Paths are carried in pointer form.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("INVALID_TARGET: {0}")]
    InvalidTarget(String),
    #[error("MISSING_VALUE: {op} at {path}")]
    MissingValue { op: String, path: String },
    #[error("INVALID_VALUE: {0}")]
    InvalidValue(String),
    #[error("TEST: {0}")]
    Test(String),
    #[error("UNKNOWN_OP: {0}")]
    UnknownOp(String),
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

// ── Op kind classification ────────────────────────────────────────────────

/// The built-in operation a kind behaves like for generic path handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpLike {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

impl OpLike {
    /// True for kinds that place a value at `path`, shifting list siblings.
    pub fn inserts(self) -> bool {
        matches!(self, OpLike::Add | OpLike::Copy | OpLike::Move)
    }
}

// ── Op ────────────────────────────────────────────────────────────────────

/// A single path-addressed edit.
///
/// `op` names the kind (`add`, `remove`, ... or an extension such as
/// `@inc`). `from` is set only for `copy` and `move`.
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    pub op: String,
    pub path: Path,
    pub from: Option<Path>,
    pub value: Option<Value>,
}

impl Op {
    /// An operation of any kind with no value or source path.
    pub fn new(op: impl Into<String>, path: Path) -> Self {
        Self {
            op: op.into(),
            path,
            from: None,
            value: None,
        }
    }

    pub fn add(path: &str, value: impl Into<Value>) -> Self {
        Self::new("add", parse_json_pointer(path)).with_value(value)
    }

    pub fn remove(path: &str) -> Self {
        Self::new("remove", parse_json_pointer(path))
    }

    pub fn replace(path: &str, value: impl Into<Value>) -> Self {
        Self::new("replace", parse_json_pointer(path)).with_value(value)
    }

    pub fn copy(from: &str, path: &str) -> Self {
        Self::new("copy", parse_json_pointer(path)).with_from(parse_json_pointer(from))
    }

    pub fn move_(from: &str, path: &str) -> Self {
        Self::new("move", parse_json_pointer(path)).with_from(parse_json_pointer(from))
    }

    pub fn test(path: &str, value: impl Into<Value>) -> Self {
        Self::new("test", parse_json_pointer(path)).with_value(value)
    }

    /// `@inc` by `amount`.
    pub fn increment(path: &str, amount: impl Into<Value>) -> Self {
        Self::new("@inc", parse_json_pointer(path)).with_value(amount)
    }

    /// `@inc` by `-amount`.
    pub fn decrement(path: &str, amount: i64) -> Self {
        Self::increment(path, -amount)
    }

    /// An extension kind carrying a value.
    pub fn custom(op: &str, path: &str, value: impl Into<Value>) -> Self {
        Self::new(op, parse_json_pointer(path)).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }

    pub fn with_from(mut self, from: Path) -> Self {
        self.from = Some(from);
        self
    }

    /// The target path in pointer form.
    pub fn pointer(&self) -> String {
        format_json_pointer(&self.path)
    }

    /// The source path in pointer form, for `copy` and `move`.
    pub fn from_pointer(&self) -> Option<String> {
        self.from.as_deref().map(format_json_pointer)
    }

    /// The value, or `MissingValue` when the kind needs one.
    pub fn require_value(&self) -> Result<&Value, PatchError> {
        self.value.as_ref().ok_or_else(|| PatchError::MissingValue {
            op: self.op.clone(),
            path: self.pointer(),
        })
    }

    /// The source path, or `InvalidOp` when absent.
    pub fn require_from(&self) -> Result<&Path, PatchError> {
        self.from
            .as_ref()
            .ok_or_else(|| PatchError::InvalidOp(format!("{} requires 'from'", self.op)))
    }

    /// The same operation rooted below `prefix`.
    pub fn prefixed(&self, prefix: &[String]) -> Op {
        let rebase = |path: &Path| prefix.iter().chain(path).cloned().collect::<Path>();
        Op {
            op: self.op.clone(),
            path: rebase(&self.path),
            from: self.from.as_ref().map(rebase),
            value: self.value.clone(),
        }
    }
}

// ── Options ───────────────────────────────────────────────────────────────

/// Options for [`apply_patch_with`](super::apply_patch_with).
///
/// Loadable from JSON configuration; every field defaults to off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplyOptions {
    /// Return the first error instead of skipping the operation.
    pub strict: bool,
    /// Do not log skipped operations.
    pub silent: bool,
    /// Stop at the first error.
    pub rigid: bool,
    /// With `rigid`, return the document as applied so far instead of the
    /// original.
    pub partial: bool,
    /// Pointer prefixed to every operation's paths.
    pub at_path: Option<String>,
    /// Create missing intermediate maps instead of failing with not-found.
    pub create_missing_objects: bool,
}

impl ApplyOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_parse_pointers() {
        let op = Op::move_("/a~1b/0", "/c/-");
        assert_eq!(op.op, "move");
        assert_eq!(op.path, vec!["c", "-"]);
        assert_eq!(op.from, Some(vec!["a/b".to_string(), "0".to_string()]));
        assert_eq!(op.from_pointer().as_deref(), Some("/a~1b/0"));
        assert!(op.value.is_none());
    }

    #[test]
    fn decrement_negates() {
        let op = Op::decrement("/n", 3);
        assert_eq!(op.value, Some(Value::from(-3)));
    }

    #[test]
    fn prefixed_rebases_both_paths() {
        let op = Op::copy("/x", "/y").prefixed(&["doc".to_string()]);
        assert_eq!(op.pointer(), "/doc/y");
        assert_eq!(op.from_pointer().as_deref(), Some("/doc/x"));
    }

    #[test]
    fn require_value_reports_kind_and_path() {
        let err = Op::new("add", vec!["k".into()]).require_value().unwrap_err();
        assert_eq!(
            err,
            PatchError::MissingValue {
                op: "add".into(),
                path: "/k".into()
            }
        );
    }

    #[test]
    fn options_deserialize_camel_case() {
        let options: ApplyOptions =
            serde_json::from_value(json!({"strict": true, "atPath": "/doc", "createMissingObjects": true}))
                .unwrap();
        assert!(options.strict);
        assert!(!options.rigid);
        assert_eq!(options.at_path.as_deref(), Some("/doc"));
        assert!(options.create_missing_objects);
    }
}
