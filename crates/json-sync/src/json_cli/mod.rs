//! `json-sync` command-line tools.
//!
//! The logic behind the binary's subcommands, taking and returning JSON
//! text:
//! - `apply`     - apply a patch to a document
//! - `transform` - rewrite a patch to run after a concurrent one
//! - `invert`    - build the undo patch for a document and a patch
//! - `compose`   - collapse a patch
//!
//! Every command understands the built-in kinds plus `@text` deltas.

use thiserror::Error;

use json_sync_util::Value;

use crate::json_ot::ot_text::TextHandler;
use crate::json_patch::{apply_patch_with, from_json_patch, to_json_patch, ApplyOptions, Op, PatchError, Registry};
use crate::json_patch_compose::compose_patch_with;
use crate::json_patch_invert::{invert_patch_with, InvertError};
use crate::json_patch_ot::transform_patch_with;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Invert(#[from] InvertError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The operation kinds the tools accept.
pub fn registry() -> Registry {
    Registry::default().with("@text", TextHandler)
}

fn parse_doc(json: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str(json)?)
}

fn parse_patch(json: &str) -> Result<Vec<Op>, CliError> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    Ok(from_json_patch(&raw)?)
}

fn print_patch(ops: &[Op]) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&to_json_patch(ops))?)
}

// ── apply ─────────────────────────────────────────────────────────────────

/// Apply `patch_json` to `doc_json`; returns the pretty-printed result.
pub fn apply_json_patch(doc_json: &str, patch_json: &str, options: &ApplyOptions) -> Result<String, CliError> {
    let doc = parse_doc(doc_json)?;
    let ops = parse_patch(patch_json)?;
    let out = apply_patch_with(&doc, &ops, options, &registry())?;
    Ok(serde_json::to_string_pretty(&out)?)
}

// ── transform ─────────────────────────────────────────────────────────────

/// Rewrite `other_json` to run after `this_json`, both made against
/// `doc_json`.
pub fn transform_json_patch(doc_json: &str, this_json: &str, other_json: &str) -> Result<String, CliError> {
    let doc = parse_doc(doc_json)?;
    let this = parse_patch(this_json)?;
    let other = parse_patch(other_json)?;
    print_patch(&transform_patch_with(&doc, &this, &other, &registry()))
}

// ── invert ────────────────────────────────────────────────────────────────

pub fn invert_json_patch(doc_json: &str, patch_json: &str) -> Result<String, CliError> {
    let doc = parse_doc(doc_json)?;
    let ops = parse_patch(patch_json)?;
    print_patch(&invert_patch_with(&doc, &ops, &registry())?)
}

// ── compose ───────────────────────────────────────────────────────────────

pub fn compose_json_patch(patch_json: &str) -> Result<String, CliError> {
    let ops = parse_patch(patch_json)?;
    print_patch(&compose_patch_with(&ops, &registry()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(pretty: &str) -> String {
        let v: serde_json::Value = serde_json::from_str(pretty).unwrap();
        v.to_string()
    }

    #[test]
    fn apply_prints_document() {
        let out = apply_json_patch(
            r#"{"a":1}"#,
            r#"[{"op":"add","path":"/b","value":2}]"#,
            &ApplyOptions::default(),
        )
        .unwrap();
        assert_eq!(compact(&out), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn apply_strict_reports_error() {
        let err = apply_json_patch("{}", r#"[{"op":"remove","path":"/x"}]"#, &ApplyOptions::strict()).unwrap_err();
        assert!(matches!(err, CliError::Patch(PatchError::NotFound(_))));
    }

    #[test]
    fn apply_understands_text_deltas() {
        let out = apply_json_patch(
            r#"{"s":"ab"}"#,
            r#"[{"op":"@text","path":"/s","value":[{"retain":2},{"insert":"c"}]}]"#,
            &ApplyOptions::strict(),
        )
        .unwrap();
        assert_eq!(compact(&out), r#"{"s":"abc"}"#);
    }

    #[test]
    fn transform_shifts_index() {
        let out = transform_json_patch(
            r#"{"l":[1,2]}"#,
            r#"[{"op":"add","path":"/l/0","value":0}]"#,
            r#"[{"op":"replace","path":"/l/1","value":9}]"#,
        )
        .unwrap();
        assert_eq!(compact(&out), r#"[{"op":"replace","path":"/l/2","value":9}]"#);
    }

    #[test]
    fn invert_builds_undo() {
        let out = invert_json_patch(r#"{"a":1}"#, r#"[{"op":"replace","path":"/a","value":2}]"#).unwrap();
        assert_eq!(compact(&out), r#"[{"op":"replace","path":"/a","value":1}]"#);
    }

    #[test]
    fn compose_merges_increments() {
        let out = compose_json_patch(
            r#"[{"op":"@inc","path":"/n","value":1},{"op":"@inc","path":"/n","value":2}]"#,
        )
        .unwrap();
        assert_eq!(compact(&out), r#"[{"op":"@inc","path":"/n","value":3}]"#);
    }

    #[test]
    fn bad_json_is_reported() {
        assert!(matches!(compose_json_patch("[").unwrap_err(), CliError::Json(_)));
        assert!(matches!(
            compose_json_patch(r#"[{"op":"add"}]"#).unwrap_err(),
            CliError::Patch(_)
        ));
    }
}
