//! Operational transformation types for values inside a document.
//!
//! Currently one type: character deltas over strings, exposed to patches
//! through [`TextHandler`](ot_text::TextHandler).

pub mod types;

pub use types::ot_text;
