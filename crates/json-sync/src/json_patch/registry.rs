//! Operation handlers and the registry that maps kind names to them.
//!
//! Every engine (apply, transform, invert, compose) dispatches through a
//! [`Registry`], so a new operation kind is added by registering a handler,
//! without touching the engines.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use json_sync_util::Value;

use crate::json_patch_invert::InvertError;
use crate::json_patch_ot::TransformContext;

use super::context::{ApplyContext, InvertInput};
use super::ops::{AddOp, CopyOp, IncOp, MoveOp, RemoveOp, ReplaceOp, TestOp};
use super::types::{Op, OpLike, PatchError};

/// The behaviour of one operation kind.
pub trait OpHandler: Send + Sync {
    /// The built-in kind this one behaves like for generic path handling.
    fn like(&self) -> OpLike;

    /// Apply `op` to the context's working document.
    fn apply(&self, ctx: &mut ApplyContext<'_>, op: &Op) -> Result<(), PatchError>;

    /// Operations undoing `input.op`, given the document it ran against.
    fn invert(&self, input: &InvertInput<'_>) -> Result<Vec<Op>, InvertError>;

    /// Rewrite `others`, authored concurrently with `this`, so they can run
    /// after `this`.
    fn transform(&self, ctx: &TransformContext<'_>, this: &Op, others: Vec<Op>) -> Vec<Op>;

    /// Merge the values of two consecutive operations of this kind on the
    /// same path. `None` means the pair cannot be merged.
    fn compose(&self, _first: &Value, _second: &Value) -> Option<Value> {
        None
    }

    /// True when the operation writes a complete value at its path.
    fn overwrites(&self) -> bool {
        matches!(
            self.like(),
            OpLike::Add | OpLike::Replace | OpLike::Copy | OpLike::Move
        )
    }

    /// True for accumulators that stay meaningful when another party
    /// rewrites the same map key concurrently.
    fn commutes(&self) -> bool {
        false
    }
}

/// Classification of a kind, as used by generic transform code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpTraits {
    pub like: Option<OpLike>,
    pub overwrites: bool,
    pub commutes: bool,
}

impl OpTraits {
    pub fn inserts(&self) -> bool {
        self.like.is_some_and(OpLike::inserts)
    }

    pub fn removes(&self) -> bool {
        self.like == Some(OpLike::Remove)
    }

    pub fn moves(&self) -> bool {
        self.like == Some(OpLike::Move)
    }
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    Registry::empty()
        .with("test", TestOp)
        .with("add", AddOp)
        .with("remove", RemoveOp)
        .with("replace", ReplaceOp)
        .with("copy", CopyOp)
        .with("move", MoveOp)
        .with("@inc", IncOp)
});

/// Kind name to handler. Cheap to clone.
#[derive(Clone)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn OpHandler>>,
}

impl Registry {
    /// A registry with no kinds at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The shared registry of built-in kinds: `test`, `add`, `remove`,
    /// `replace`, `copy`, `move` and `@inc`.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Add (or replace) a kind.
    pub fn with(mut self, kind: &str, handler: impl OpHandler + 'static) -> Self {
        self.register(kind, Arc::new(handler));
        self
    }

    pub fn register(&mut self, kind: &str, handler: Arc<dyn OpHandler>) {
        self.handlers.insert(kind.to_string(), handler);
    }

    pub fn get(&self, kind: &str) -> Option<&dyn OpHandler> {
        self.handlers.get(kind).map(|h| h.as_ref())
    }

    /// Like [`get`](Self::get), failing with `UnknownOp`.
    pub fn handler(&self, kind: &str) -> Result<&dyn OpHandler, PatchError> {
        self.get(kind)
            .ok_or_else(|| PatchError::UnknownOp(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Classification of `kind`; unknown kinds have no traits.
    pub fn traits(&self, kind: &str) -> OpTraits {
        match self.get(kind) {
            Some(handler) => OpTraits {
                like: Some(handler.like()),
                overwrites: handler.overwrites(),
                commutes: handler.commutes(),
            },
            None => OpTraits::default(),
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl Default for Registry {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.kinds().collect();
        kinds.sort_unstable();
        f.debug_struct("Registry").field("kinds", &kinds).finish()
    }
}
