//! JSON Pointer (RFC 6901) utilities.
//!
//! This crate implements the path helpers the patch engine is built on:
//! parsing and formatting [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901)
//! strings, parent/child relations between paths, list-index classification
//! and `*`-wildcard pointer patterns.
//!
//! # Example
//!
//! ```
//! use json_sync_pointer::{format_json_pointer, is_child, parse_json_pointer};
//!
//! let path = parse_json_pointer("/foo/bar");
//! assert_eq!(path, vec!["foo".to_string(), "bar".to_string()]);
//! assert_eq!(format_json_pointer(&path), "/foo/bar");
//! assert!(is_child(&["foo".to_string()], &path));
//! ```

use thiserror::Error;

pub mod pattern;
pub mod types;
pub mod util;
pub mod validate;

pub use pattern::PathPattern;
pub use types::{Path, PathStep};
pub use util::{
    escape_component, format_json_pointer, is_child, is_list_step, is_valid_index, parent,
    parse_json_pointer, split_last, starts_with, unescape_component, APPEND_STEP,
};
pub use validate::{validate_json_pointer, validate_path, ValidationError};

/// Errors that can occur when working with JSON Pointers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("NO_PARENT")]
    NoParent,
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("INVALID_ESCAPE at {0}")]
    InvalidEscape(usize),
    #[error("PATH_TOO_DEEP")]
    PathTooDeep,
}

impl From<ValidationError> for JsonPointerError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::PointerInvalid => JsonPointerError::PointerInvalid,
            ValidationError::PointerTooLong => JsonPointerError::PointerTooLong,
            ValidationError::InvalidEscape(at) => JsonPointerError::InvalidEscape(at),
            ValidationError::PathTooDeep => JsonPointerError::PathTooDeep,
        }
    }
}
