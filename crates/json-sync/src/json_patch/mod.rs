//! JSON Patch: path-addressed edit operations and their application.
//!
//! # Operations
//!
//! The RFC 6902 kinds `add`, `remove`, `replace`, `copy`, `move` and `test`
//! are built in, together with the `@inc` numeric accumulator. Further kinds
//! are plugged in through a [`Registry`].

pub mod apply;
pub mod builder;
pub mod codec;
pub mod context;
pub mod ops;
pub mod registry;
pub mod types;

pub use apply::{apply_patch, apply_patch_with};
pub use builder::Patch;
pub use codec::json::{from_json, from_json_patch, to_json, to_json_patch};
pub use context::{ApplyContext, Container, InvertInput};
pub use registry::{OpHandler, OpTraits, Registry};
pub use types::{ApplyOptions, Op, OpLike, PatchError, Path};
