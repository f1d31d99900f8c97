//! json-sync-util - the document value type and helpers shared by the
//! json-sync crates.
//!
//! Documents are trees of maps, lists and scalars. Containers are held
//! behind `Arc` so an edit can copy only the containers on the written path
//! and share every other subtree with the input document.

pub mod is_empty;
pub mod json_clone;
pub mod json_equal;
pub mod number;
pub mod value;

pub use is_empty::{is_empty_map, is_empty_object};
pub use json_clone::{deep_clone, from_json, to_json};
pub use json_equal::deep_equal;
pub use number::{add_numbers, negate_number, number_from_f64, numbers_equal};
pub use value::{Array, Object, Value};
