//! json-sync - operational transformation over JSON Patch, and a
//! revisioned replication layer built on it.
//!
//! Two or more parties edit a shared document (nested maps, ordered lists
//! and scalars) independently and reconcile their edits afterwards:
//!
//! - [`json_patch`] applies path-addressed operations to a document,
//!   sharing every untouched subtree with the input.
//! - [`json_patch_ot`] rewrites one operation list so it can run after a
//!   concurrent one.
//! - [`json_patch_invert`] and [`json_patch_compose`] build undo lists and
//!   collapse consecutive edits.
//! - [`json_ot`] holds the rich-text delta type, pluggable as a custom
//!   operation kind.
//! - [`syncable`] tracks revisions and pending local edits between a
//!   server and its clients.

pub mod json_cli;
pub mod json_ot;
pub mod json_patch;
pub mod json_patch_compose;
pub mod json_patch_invert;
pub mod json_patch_ot;
pub mod syncable;

pub use json_sync_util::Value;
