//! Pointer syntax checks applied to pointers arriving from the wire.

use thiserror::Error;

/// Longest pointer string accepted.
pub const MAX_POINTER_LEN: usize = 1024;

/// Deepest path accepted.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    /// A `~` not followed by `0` or `1`, at the given byte offset.
    #[error("INVALID_ESCAPE at {0}")]
    InvalidEscape(usize),
    #[error("PATH_TOO_DEEP")]
    PathTooDeep,
}

/// Check that `pointer` is the empty (root) pointer or starts with `/`,
/// fits the length and depth limits and uses only `~0` and `~1` escapes.
///
/// ```
/// use json_sync_pointer::{validate_json_pointer, ValidationError};
///
/// assert!(validate_json_pointer("").is_ok());
/// assert!(validate_json_pointer("/a~1b/~0").is_ok());
/// assert_eq!(validate_json_pointer("a"), Err(ValidationError::PointerInvalid));
/// assert_eq!(validate_json_pointer("/a~2"), Err(ValidationError::InvalidEscape(2)));
/// ```
pub fn validate_json_pointer(pointer: &str) -> Result<(), ValidationError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(ValidationError::PointerInvalid);
    }
    if pointer.len() > MAX_POINTER_LEN {
        return Err(ValidationError::PointerTooLong);
    }
    let bytes = pointer.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'~' && !matches!(bytes.get(i + 1), Some(b'0' | b'1')) {
            return Err(ValidationError::InvalidEscape(i));
        }
    }
    if bytes.iter().filter(|&&b| b == b'/').count() > MAX_DEPTH {
        return Err(ValidationError::PathTooDeep);
    }
    Ok(())
}

/// Check the depth of an already split path.
pub fn validate_path(path: &[String]) -> Result<(), ValidationError> {
    if path.len() > MAX_DEPTH {
        return Err(ValidationError::PathTooDeep);
    }
    Ok(())
}
