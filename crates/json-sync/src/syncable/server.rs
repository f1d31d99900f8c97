use std::collections::BTreeMap;

use tracing::{debug, warn};

use json_sync_util::Value;

use crate::json_patch::{ApplyContext, Op, Registry};

use super::{is_under, newer_than, snapshot, touched, AccessList, Rev, SyncError, SyncMeta, SyncableOptions};

type PatchListener = Box<dyn FnMut(&[Op], &Rev) + Send + Sync>;

/// The authoritative replica.
pub struct SyncableServer {
    doc: Value,
    meta: SyncMeta,
    access: AccessList,
    registry: Registry,
    rev_pad: Option<usize>,
    next_listener_id: u64,
    listeners: BTreeMap<u64, PatchListener>,
}

impl SyncableServer {
    pub fn new(doc: Value, meta: SyncMeta, options: SyncableOptions) -> Self {
        Self::with_registry(doc, meta, options, Registry::default())
    }

    pub fn with_registry(doc: Value, meta: SyncMeta, options: SyncableOptions, registry: Registry) -> Self {
        Self {
            doc,
            meta,
            access: AccessList::from_options(&options),
            registry,
            rev_pad: options.rev_pad,
            next_listener_id: 1,
            listeners: BTreeMap::new(),
        }
    }

    /// Register a listener for every committed patch.
    pub fn on_patch<F>(&mut self, listener: F) -> u64
    where
        F: FnMut(&[Op], &Rev) + Send + Sync + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, listener_id: u64) -> bool {
        self.listeners.remove(&listener_id).is_some()
    }

    pub fn get(&self) -> &Value {
        &self.doc
    }

    pub fn get_meta(&self) -> &SyncMeta {
        &self.meta
    }

    pub fn get_rev(&self) -> &Rev {
        &self.meta.rev
    }

    pub fn set(&mut self, doc: Value, meta: SyncMeta) {
        self.doc = doc;
        self.meta = meta;
    }

    /// Apply an edit made on the server itself.
    ///
    /// Nothing is committed when the document does not change; the current
    /// revision is returned with no operations.
    pub fn change(&mut self, ops: &[Op]) -> Result<(Vec<Op>, Rev), SyncError> {
        let mut ctx = ApplyContext::new(&self.doc, &self.registry);
        let mut paths = Vec::new();
        for op in ops {
            let before = ctx.root().clone();
            let hit = touched(&self.registry, ctx.root(), op);
            ctx.apply_op(op)?;
            if !ctx.root().ptr_eq(&before) {
                paths.extend(hit);
            }
        }
        let next = ctx.into_root();
        if next.ptr_eq(&self.doc) {
            return Ok((Vec::new(), self.meta.rev.clone()));
        }
        self.doc = next;
        self.commit(paths, ops);
        Ok((ops.to_vec(), self.meta.rev.clone()))
    }

    /// Apply operations sent by a replica that last saw revision `rev`.
    ///
    /// Returns the corrective operations the replica must apply, the
    /// revision after this call and the operations that were applied. An
    /// operation that is forbidden or fails is skipped and answered with a
    /// snapshot of its path. Paths that changed after `rev` are answered with
    /// snapshots too, except lists when `ignore_lists` is set.
    pub fn receive(&mut self, ops: &[Op], rev: Option<&Rev>, ignore_lists: bool) -> (Vec<Op>, Rev, Vec<Op>) {
        let stale = rev.map(|r| newer_than(&self.meta.paths, r)).unwrap_or_default();

        let mut ctx = ApplyContext::new(&self.doc, &self.registry);
        let mut rejected: Vec<String> = Vec::new();
        let mut applied = Vec::new();
        let mut paths = Vec::new();
        for op in ops {
            if let Err(err) = self.access.check(op) {
                warn!(op = %op.op, path = %op.pointer(), error = %err, "rejecting operation");
                if let SyncError::Forbidden(pointer) = err {
                    rejected.push(pointer);
                }
                continue;
            }
            let before = ctx.root().clone();
            let hit = touched(&self.registry, ctx.root(), op);
            if let Err(err) = ctx.apply_op(op) {
                warn!(op = %op.op, path = %op.pointer(), error = %err, "rejecting operation");
                ctx.set_root(before);
                rejected.push(op.pointer());
                continue;
            }
            if !ctx.root().ptr_eq(&before) {
                paths.extend(hit);
            }
            applied.push(op.clone());
        }

        let next = ctx.into_root();
        if !next.ptr_eq(&self.doc) {
            self.doc = next;
            self.commit(paths, &applied);
        }

        let mut corrective: Vec<Op> = Vec::new();
        let mut answered: Vec<String> = Vec::new();
        for pointer in rejected {
            if !answered.contains(&pointer) {
                corrective.push(snapshot(&self.doc, &pointer));
                answered.push(pointer);
            }
        }
        for pointer in stale {
            if answered.contains(&pointer) {
                continue;
            }
            let op = snapshot(&self.doc, &pointer);
            if ignore_lists && matches!(op.value, Some(Value::Array(_))) {
                continue;
            }
            corrective.push(op);
            answered.push(pointer);
        }
        (corrective, self.meta.rev.clone(), applied)
    }

    /// What a replica at `rev` needs to catch up: the whole document when
    /// `rev` is `None`, otherwise a snapshot of every path changed after it.
    pub fn changes_since(&self, rev: Option<&Rev>) -> (Vec<Op>, Rev) {
        let ops = match rev {
            None => vec![Op::new("replace", Vec::new()).with_value(self.doc.clone())],
            Some(rev) => newer_than(&self.meta.paths, rev)
                .iter()
                .map(|pointer| snapshot(&self.doc, pointer))
                .collect(),
        };
        (ops, self.meta.rev.clone())
    }

    /// Advance the revision, stamp `paths` with it and notify listeners.
    fn commit(&mut self, paths: Vec<(String, f64)>, ops: &[Op]) {
        let rev = self.meta.rev.next(self.rev_pad);
        for (pointer, _) in paths {
            self.meta.paths.retain(|p, _| !is_under(p, &pointer));
            self.meta.paths.insert(pointer, rev.clone());
        }
        debug!(%rev, ops = ops.len(), "committed");
        self.meta.rev = rev;
        for listener in self.listeners.values_mut() {
            listener(ops, &self.meta.rev);
        }
    }
}
