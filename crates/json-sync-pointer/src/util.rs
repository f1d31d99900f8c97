use crate::JsonPointerError;

/// The list step that addresses the position after the last element.
pub const APPEND_STEP: &str = "-";

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// ```
/// use json_sync_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("no-escapes"), "no-escapes");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// ```
/// use json_sync_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into path components.
///
/// - Empty string is the root (empty path)
/// - The leading `/` is stripped
/// - Each component is unescaped
///
/// ```
/// use json_sync_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/"), vec![""]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..].split('/').map(unescape_component).collect()
}

/// Format path components into a JSON Pointer string.
///
/// Returns an empty string for the root path.
///
/// ```
/// use json_sync_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["foo".to_string(), "bar".to_string()]), "/foo/bar");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Check if `child` lies strictly below `parent`.
///
/// ```
/// use json_sync_pointer::is_child;
///
/// let parent = vec!["foo".to_string()];
/// let child = vec!["foo".to_string(), "bar".to_string()];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// assert!(!is_child(&parent, &parent));
/// ```
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    child.len() > parent.len() && child[..parent.len()] == *parent
}

/// Check if `path` equals `prefix` or lies below it.
pub fn starts_with(path: &[String], prefix: &[String]) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()] == *prefix
}

/// Get the parent path of a given path.
///
/// ```
/// use json_sync_pointer::parent;
///
/// assert_eq!(parent(&["foo".to_string(), "bar".to_string()]).unwrap(), vec!["foo"]);
/// assert!(parent(&[]).is_err());
/// ```
pub fn parent(path: &[String]) -> Result<Vec<String>, JsonPointerError> {
    if path.is_empty() {
        return Err(JsonPointerError::NoParent);
    }
    Ok(path[..path.len() - 1].to_vec())
}

/// Split a path into its container path and final key.
///
/// Returns `None` for the root path, which has no container.
pub fn split_last(path: &[String]) -> Option<(&[String], &str)> {
    let (last, rest) = path.split_last()?;
    Some((rest, last.as_str()))
}

/// Check if a string represents a valid non-negative integer array index.
///
/// ```
/// use json_sync_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("abc"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Check if a step can address a list slot: an index or the append marker.
pub fn is_list_step(step: &str) -> bool {
    step == APPEND_STEP || is_valid_index(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn starts_with_includes_equal_paths() {
        assert!(starts_with(&p(&["a", "b"]), &p(&["a", "b"])));
        assert!(starts_with(&p(&["a", "b"]), &p(&["a"])));
        assert!(starts_with(&p(&["a"]), &[]));
        assert!(!starts_with(&p(&["a"]), &p(&["a", "b"])));
        assert!(!starts_with(&p(&["ab"]), &p(&["a"])));
    }

    #[test]
    fn split_last_separates_key() {
        let path = p(&["list", "3"]);
        let (container, key) = split_last(&path).unwrap();
        assert_eq!(container, &p(&["list"])[..]);
        assert_eq!(key, "3");
        assert!(split_last(&[]).is_none());
    }

    #[test]
    fn list_steps() {
        assert!(is_list_step("-"));
        assert!(is_list_step("7"));
        assert!(!is_list_step("07"));
        assert!(!is_list_step("x"));
    }

    #[test]
    fn escaping_round_trips() {
        for raw in ["a/b", "~", "~1", "plain", ""] {
            assert_eq!(unescape_component(&escape_component(raw)), raw);
        }
    }
}
