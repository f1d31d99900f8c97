//! Replicated documents.
//!
//! A [`SyncableServer`] holds the authoritative document and a revision that
//! advances with every accepted change; it remembers the revision at which
//! each path last changed so it can tell a lagging replica what it missed.
//! A [`SyncableClient`] applies local edits optimistically, remembers which
//! paths it changed, and sends full-value snapshots of them to the server.
//!
//! ```
//! use json_sync::json_patch::Op;
//! use json_sync::syncable::{SyncMeta, SyncableClient, SyncableOptions, SyncableServer};
//! use json_sync::Value;
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"count": 0}));
//! let mut server = SyncableServer::new(doc.clone(), SyncMeta::default(), SyncableOptions::default());
//! let mut client = SyncableClient::new(doc, SyncMeta::default(), SyncableOptions::default());
//!
//! client.change(&[Op::increment("/count", 2)]).unwrap();
//! let ops = client.begin_send().unwrap();
//! let (_, rev, _) = server.receive(&ops, Some(client.get_rev()), false);
//! client.finish_send(true);
//! client.receive(&[], &rev, false);
//! assert_eq!(server.get(), client.get());
//! ```

mod client;
mod filter;
mod rev;
mod server;

pub use client::SyncableClient;
pub use filter::AccessList;
pub use rev::Rev;
pub use server::SyncableServer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use json_sync_pointer::{format_json_pointer, is_list_step, parse_json_pointer, split_last, PathPattern};
use json_sync_util::Value;

use crate::json_patch::{Op, PatchError, Registry};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("writes to {0} are not allowed")]
    Forbidden(String),
    #[error("invalid revision {0:?}")]
    InvalidRev(String),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Replica configuration. Loadable from JSON; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncableOptions {
    pub whitelist: Option<Vec<PathPattern>>,
    pub blacklist: Option<Vec<PathPattern>>,
    /// Zero-pad revisions to this many characters.
    pub rev_pad: Option<usize>,
    /// Build a server rather than a client.
    pub server: bool,
}

/// Replication bookkeeping stored alongside a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub rev: Rev,
    /// Server: pointer -> revision at which it last changed.
    #[serde(default)]
    pub paths: BTreeMap<String, Rev>,
    /// Client: pointer -> pending local change, 0 for a full value or the
    /// accumulated increment.
    #[serde(default)]
    pub changed: BTreeMap<String, f64>,
}

/// Either side of the protocol, as built by [`syncable`].
pub enum Syncable {
    Client(SyncableClient),
    Server(SyncableServer),
}

/// Build a client or a server depending on `options.server`.
pub fn syncable(doc: Value, meta: Option<SyncMeta>, options: SyncableOptions) -> Syncable {
    let meta = meta.unwrap_or_default();
    if options.server {
        Syncable::Server(SyncableServer::new(doc, meta, options))
    } else {
        Syncable::Client(SyncableClient::new(doc, meta, options))
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────

/// True when `pointer` lies strictly below `ancestor`.
fn is_under(pointer: &str, ancestor: &str) -> bool {
    pointer.len() > ancestor.len()
        && pointer.starts_with(ancestor)
        && pointer.as_bytes()[ancestor.len()] == b'/'
}

/// Equal, ancestor or descendant.
fn related(a: &str, b: &str) -> bool {
    a == b || is_under(a, b) || is_under(b, a)
}

/// The full-value operation bringing a replica's `pointer` in line with
/// `doc`.
fn snapshot(doc: &Value, pointer: &str) -> Op {
    let path = parse_json_pointer(pointer);
    match doc.get(&path) {
        Some(value) => Op::new("replace", path).with_value(value.clone()),
        None => Op::new("remove", path),
    }
}

/// The entries of `paths` newer than `since`, without those already
/// covered by a newer ancestor.
fn newer_than(paths: &BTreeMap<String, Rev>, since: &Rev) -> Vec<String> {
    let newer: Vec<&String> = paths
        .iter()
        .filter(|(_, at)| *at > since)
        .map(|(pointer, _)| pointer)
        .collect();
    newer
        .iter()
        .filter(|p| !newer.iter().any(|a| is_under(p, a)))
        .map(|p| p.to_string())
        .collect()
}

/// The pointers an applied operation changed, each with its increment
/// amount (0 for a full-value change).
///
/// Inserting into, removing from or moving within a list changes the whole
/// list: every index after the slot moves.
fn touched(registry: &Registry, doc: &Value, op: &Op) -> Vec<(String, f64)> {
    let traits = registry.traits(&op.op);
    let in_list = |path: &[String]| match split_last(path) {
        Some((parent, last)) => match doc.get(parent) {
            Some(Value::Array(_)) => Some(parent.to_vec()),
            Some(_) => None,
            None => is_list_step(last).then(|| parent.to_vec()),
        },
        None => None,
    };

    let mut out = Vec::new();
    if traits.like.is_none() || traits.like == Some(crate::json_patch::OpLike::Test) {
        return out;
    }
    if traits.moves() {
        if let Some(from) = &op.from {
            let pointer = in_list(from.as_slice()).unwrap_or_else(|| from.clone());
            out.push((format_json_pointer(&pointer), 0.0));
        }
    }
    let structural = traits.inserts() || traits.removes();
    let path = match structural.then(|| in_list(op.path.as_slice())).flatten() {
        Some(list) => list,
        None => op.path.clone(),
    };
    let amount = if traits.commutes {
        op.value.as_ref().and_then(Value::as_f64).unwrap_or(0.0)
    } else {
        0.0
    };
    out.push((format_json_pointer(&path), amount));
    out
}
