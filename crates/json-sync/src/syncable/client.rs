use std::collections::BTreeMap;
use std::future::Future;

use tracing::debug;

use json_sync_pointer::format_json_pointer;
use json_sync_util::{add_numbers, number_from_f64, Value};

use crate::json_patch::{apply_patch_with, ApplyContext, ApplyOptions, Op, Registry};

use super::{is_under, related, snapshot, touched, AccessList, Rev, SyncError, SyncMeta, SyncableOptions};

type Subscriber = Box<dyn FnMut(&Value, &[Op]) + Send + Sync>;

/// A replica that edits optimistically and reports full values upstream.
pub struct SyncableClient {
    doc: Value,
    meta: SyncMeta,
    /// Entries of `meta.changed` handed to the transport and not yet
    /// acknowledged.
    in_flight: Option<BTreeMap<String, f64>>,
    access: AccessList,
    registry: Registry,
    next_subscriber_id: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

impl SyncableClient {
    pub fn new(doc: Value, meta: SyncMeta, options: SyncableOptions) -> Self {
        Self::with_registry(doc, meta, options, Registry::default())
    }

    /// A client that understands the kinds in `registry`.
    pub fn with_registry(doc: Value, meta: SyncMeta, options: SyncableOptions, registry: Registry) -> Self {
        Self {
            doc,
            meta,
            in_flight: None,
            access: AccessList::from_options(&options),
            registry,
            next_subscriber_id: 1,
            subscribers: BTreeMap::new(),
        }
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> u64
    where
        F: FnMut(&Value, &[Op]) + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id;
        self.next_subscriber_id = self.next_subscriber_id.saturating_add(1);
        self.subscribers.insert(id, Box::new(subscriber));
        id
    }

    pub fn unsubscribe(&mut self, subscriber_id: u64) -> bool {
        self.subscribers.remove(&subscriber_id).is_some()
    }

    fn notify(&mut self, ops: &[Op]) {
        for subscriber in self.subscribers.values_mut() {
            subscriber(&self.doc, ops);
        }
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

    /// Replace the document and its bookkeeping. Any outstanding send is
    /// forgotten.
    pub fn set(&mut self, doc: Value, meta: SyncMeta) {
        self.doc = doc;
        self.meta = meta;
        self.in_flight = None;
        self.notify(&[]);
    }

    /// True while a send awaits its acknowledgement.
    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Apply a local edit and remember what it touched.
    ///
    /// Every operation is checked against the access lists first; a
    /// forbidden or failing operation leaves the document unchanged.
    pub fn change(&mut self, ops: &[Op]) -> Result<Value, SyncError> {
        for op in ops {
            self.access.check(op)?;
        }
        let mut ctx = ApplyContext::new(&self.doc, &self.registry);
        let mut paths = Vec::new();
        for op in ops {
            paths.extend(touched(&self.registry, ctx.root(), op));
            ctx.apply_op(op)?;
        }
        let next = ctx.into_root();
        if next.ptr_eq(&self.doc) {
            return Ok(next);
        }
        self.doc = next;
        for (pointer, amount) in paths {
            track(&mut self.meta.changed, pointer, amount);
        }
        self.notify(ops);
        Ok(self.doc.clone())
    }

    /// Snapshot the pending changes for sending and mark them in flight.
    ///
    /// Returns `None` when nothing is pending or a send is already
    /// outstanding.
    pub fn begin_send(&mut self) -> Option<Vec<Op>> {
        if self.in_flight.is_some() || self.meta.changed.is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut self.meta.changed);
        let ops = pending.keys().map(|pointer| snapshot(&self.doc, pointer)).collect();
        self.in_flight = Some(pending);
        Some(ops)
    }

    /// Settle the outstanding send. On failure its paths become pending
    /// again, merged with whatever changed meanwhile.
    pub fn finish_send(&mut self, ok: bool) {
        let Some(sent) = self.in_flight.take() else {
            return;
        };
        if ok {
            return;
        }
        debug!(paths = sent.len(), "send failed, changes pending again");
        for (pointer, amount) in sent {
            track(&mut self.meta.changed, pointer, amount);
        }
    }

    /// Send pending changes through `transport` and settle according to its
    /// result. Returns `None` when there was nothing to send.
    ///
    /// The client stays borrowed until the transport finishes; callers that
    /// need to keep editing meanwhile use [`begin_send`](Self::begin_send)
    /// and [`finish_send`](Self::finish_send).
    pub async fn send<F, Fut, T, E>(&mut self, transport: F) -> Option<Result<T, E>>
    where
        F: FnOnce(Vec<Op>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let ops = self.begin_send()?;
        let result = transport(ops).await;
        self.finish_send(result.is_ok());
        Some(result)
    }

    /// Apply operations from upstream at revision `rev`.
    ///
    /// Operations on in-flight paths are suppressed. Operations on pending
    /// paths are dropped, except that a number under a pending increment is
    /// shifted by the increment; with `overwrite` they are applied instead
    /// and the pending entries discarded.
    pub fn receive(&mut self, ops: &[Op], rev: &Rev, overwrite: bool) -> Value {
        if *rev <= self.meta.rev {
            debug!(%rev, current = %self.meta.rev, "ignoring stale revision");
            return self.doc.clone();
        }

        let mut accepted = Vec::with_capacity(ops.len());
        for op in ops {
            let pointers: Vec<String> = std::iter::once(&op.path)
                .chain(op.from.as_ref())
                .map(|path| format_json_pointer(path))
                .collect();

            let sending = self.in_flight.as_ref().is_some_and(|sent| {
                pointers
                    .iter()
                    .any(|p| sent.keys().any(|k| p == k || is_under(p, k)))
            });
            if sending {
                debug!(op = %op.op, path = %op.pointer(), "suppressed, path in flight");
                continue;
            }

            let pending: Vec<String> = self
                .meta
                .changed
                .keys()
                .filter(|k| pointers.iter().any(|p| related(p, k)))
                .cloned()
                .collect();
            if pending.is_empty() {
                accepted.push(op.clone());
            } else if overwrite {
                for key in &pending {
                    self.meta.changed.remove(key);
                }
                accepted.push(op.clone());
            } else if let Some(shifted) = self.shift_by_pending(op, &pending) {
                accepted.push(shifted);
            } else {
                debug!(op = %op.op, path = %op.pointer(), "dropped, path changed locally");
            }
        }

        let next = apply_patch_with(&self.doc, &accepted, &ApplyOptions::default(), &self.registry)
            .unwrap_or_else(|_| self.doc.clone());
        self.meta.rev = rev.clone();
        debug!(rev = %self.meta.rev, ops = accepted.len(), "received");
        if !next.ptr_eq(&self.doc) {
            self.doc = next;
            self.notify(&accepted);
        }
        self.doc.clone()
    }

    /// `op` with its number moved by the pending increment at its path.
    fn shift_by_pending(&self, op: &Op, pending: &[String]) -> Option<Op> {
        let [key] = pending else {
            return None;
        };
        let amount = *self.meta.changed.get(key)?;
        if amount == 0.0 || op.from.is_some() || *key != op.pointer() {
            return None;
        }
        let Some(Value::Number(n)) = &op.value else {
            return None;
        };
        let shifted = add_numbers(n, &number_from_f64(amount)?)?;
        Some(op.clone().with_value(Value::Number(shifted)))
    }
}

/// Record a change at `pointer` in a pending set.
///
/// A change under a tracked ancestor is already covered. Two increments of
/// the same path add up; anything else at that path makes it a full-value
/// change. A new ancestor absorbs the tracked paths under it.
fn track(changed: &mut BTreeMap<String, f64>, pointer: String, amount: f64) {
    if changed.keys().any(|tracked| is_under(&pointer, tracked)) {
        return;
    }
    if let Some(prev) = changed.get_mut(&pointer) {
        *prev = if *prev != 0.0 && amount != 0.0 {
            *prev + amount
        } else {
            0.0
        };
        return;
    }
    changed.retain(|tracked, _| !is_under(tracked, &pointer));
    changed.insert(pointer, amount);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_patch::PatchError;
    use json_sync_pointer::PathPattern;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn client(doc: serde_json::Value) -> SyncableClient {
        SyncableClient::new(Value::from(doc), SyncMeta::default(), SyncableOptions::default())
    }

    fn rev(s: &str) -> Rev {
        Rev::parse(s).unwrap()
    }

    fn changed(c: &SyncableClient) -> Vec<(&str, f64)> {
        c.get_meta().changed.iter().map(|(k, v)| (k.as_str(), *v)).collect()
    }

    #[test]
    fn track_coalesces() {
        let mut set = BTreeMap::new();
        track(&mut set, "/a/b".into(), 0.0);
        track(&mut set, "/a/b/c".into(), 0.0);
        assert_eq!(set.len(), 1);
        track(&mut set, "/a".into(), 0.0);
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["/a"]);
        track(&mut set, "/n".into(), 2.0);
        track(&mut set, "/n".into(), 3.0);
        assert_eq!(set.get("/n"), Some(&5.0));
        track(&mut set, "/n".into(), 0.0);
        assert_eq!(set.get("/n"), Some(&0.0));
    }

    #[test]
    fn change_records_touched_paths() {
        let mut c = client(json!({"list": [1, 2], "n": 0, "m": {}}));
        c.change(&[Op::add("/list/0", 0), Op::increment("/n", 2), Op::add("/m/k", 1)])
            .unwrap();
        assert_eq!(changed(&c), vec![("/list", 0.0), ("/m/k", 0.0), ("/n", 2.0)]);
        c.change(&[Op::replace("/m", json!({}))]).unwrap();
        assert_eq!(changed(&c), vec![("/list", 0.0), ("/m", 0.0), ("/n", 2.0)]);
    }

    #[test]
    fn failed_change_leaves_state() {
        let mut c = client(json!({"a": 1}));
        let err = c.change(&[Op::replace("/a", 2), Op::remove("/missing")]).unwrap_err();
        assert_eq!(err, SyncError::Patch(PatchError::NotFound("/missing".into())));
        assert_eq!(c.get(), &Value::from(json!({"a": 1})));
        assert!(c.get_meta().changed.is_empty());
    }

    #[test]
    fn blacklisted_change_is_forbidden() {
        let options = SyncableOptions {
            blacklist: Some(vec![PathPattern::parse("/secret").unwrap()]),
            ..SyncableOptions::default()
        };
        let mut c = SyncableClient::new(Value::from(json!({"secret": 1})), SyncMeta::default(), options);
        assert_eq!(
            c.change(&[Op::replace("/secret", 2)]),
            Err(SyncError::Forbidden("/secret".into()))
        );
    }

    #[test]
    fn unchanged_document_tracks_nothing() {
        let mut c = client(json!({"a": 1}));
        c.change(&[Op::replace("/a", 1)]).unwrap();
        assert!(c.get_meta().changed.is_empty());
    }

    #[test]
    fn send_snapshots_full_values() {
        let mut c = client(json!({"n": 1, "gone": true}));
        c.change(&[Op::increment("/n", 4), Op::remove("/gone")]).unwrap();
        let ops = c.begin_send().unwrap();
        assert_eq!(ops, vec![Op::remove("/gone"), Op::replace("/n", 5)]);
        assert!(c.is_sending());
        assert!(c.begin_send().is_none());
        c.finish_send(true);
        assert!(!c.is_sending());
        assert!(c.get_meta().changed.is_empty());
    }

    #[test]
    fn failed_send_merges_back() {
        let mut c = client(json!({"n": 0}));
        c.change(&[Op::increment("/n", 1)]).unwrap();
        c.begin_send().unwrap();
        c.change(&[Op::increment("/n", 2)]).unwrap();
        c.finish_send(false);
        assert_eq!(changed(&c), vec![("/n", 3.0)]);
    }

    #[test]
    fn async_send_settles() {
        let mut c = client(json!({"a": 0}));
        c.change(&[Op::replace("/a", 1)]).unwrap();
        let result = futures_executor::block_on(c.send(|ops| async move { Err::<(), _>(ops.len()) }));
        assert_eq!(result, Some(Err(1)));
        assert_eq!(changed(&c), vec![("/a", 0.0)]);
        let result = futures_executor::block_on(c.send(|_| async { Ok::<_, ()>("ack") }));
        assert_eq!(result, Some(Ok("ack")));
        assert!(c.get_meta().changed.is_empty());
        let result = futures_executor::block_on(c.send(|_| async { Ok::<_, ()>("ack") }));
        assert_eq!(result, None);
    }

    #[test]
    fn stale_revision_is_ignored() {
        let mut c = client(json!({"a": 0}));
        c.receive(&[Op::replace("/a", 1)], &rev("2"), false);
        let out = c.receive(&[Op::replace("/a", 2)], &rev("2"), false);
        assert_eq!(out, Value::from(json!({"a": 1})));
        let out = c.receive(&[Op::replace("/a", 3)], &rev("1"), false);
        assert_eq!(out, Value::from(json!({"a": 1})));
        assert_eq!(c.get_rev(), &rev("2"));
    }

    #[test]
    fn in_flight_paths_are_suppressed() {
        let mut c = client(json!({"a": {"x": 0}, "b": 0}));
        c.change(&[Op::replace("/a", json!({"x": 1}))]).unwrap();
        c.begin_send().unwrap();
        let out = c.receive(&[Op::replace("/a/x", 9), Op::replace("/b", 9)], &rev("1"), false);
        assert_eq!(out, Value::from(json!({"a": {"x": 1}, "b": 9})));
    }

    #[test]
    fn pending_increment_shifts_received_number() {
        let mut c = client(json!({"n": 10}));
        c.change(&[Op::increment("/n", 3)]).unwrap();
        // Server value from before the local increment.
        let out = c.receive(&[Op::replace("/n", 20)], &rev("1"), false);
        assert_eq!(out, Value::from(json!({"n": 23})));
        assert_eq!(changed(&c), vec![("/n", 3.0)]);
    }

    #[test]
    fn received_move_to_missing_parent_keeps_source() {
        let mut c = client(json!({"a": 1, "b": 2}));
        let out = c.receive(&[Op::move_("/a", "/missing/x"), Op::replace("/b", 3)], &rev("1"), false);
        assert_eq!(out, Value::from(json!({"a": 1, "b": 3})));
        assert_eq!(c.get_rev(), &rev("1"));
    }

    #[test]
    fn pending_full_value_wins_unless_overwrite() {
        let mut c = client(json!({"s": "a"}));
        c.change(&[Op::replace("/s", "mine")]).unwrap();
        let out = c.receive(&[Op::replace("/s", "theirs")], &rev("1"), false);
        assert_eq!(out, Value::from(json!({"s": "mine"})));
        let out = c.receive(&[Op::replace("/s", "theirs")], &rev("2"), true);
        assert_eq!(out, Value::from(json!({"s": "theirs"})));
        assert!(c.get_meta().changed.is_empty());
    }

    #[test]
    fn subscribers_see_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut c = client(json!({"a": 0}));
        let sink = seen.clone();
        let id = c.subscribe(move |doc, ops| sink.lock().unwrap().push((doc.clone(), ops.len())));
        c.change(&[Op::replace("/a", 1)]).unwrap();
        c.receive(&[Op::replace("/a", 1)], &rev("1"), true);
        c.receive(&[Op::replace("/a", 2)], &rev("2"), false);
        assert!(c.unsubscribe(id));
        assert!(!c.unsubscribe(id));
        c.change(&[Op::replace("/a", 3)]).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (Value::from(json!({"a": 1})), 1),
                (Value::from(json!({"a": 2})), 1),
            ]
        );
    }
}
