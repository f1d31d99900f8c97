//! Type definitions for JSON Pointer.

/// A step in a JSON Pointer path.
///
/// Object keys and list indexes are both carried as strings; a list index is
/// a step for which [`crate::is_valid_index`] holds, or the append marker `-`.
pub type PathStep = String;

/// A JSON Pointer path, already split and unescaped.
pub type Path = Vec<PathStep>;
