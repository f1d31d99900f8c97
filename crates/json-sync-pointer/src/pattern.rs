//! Pointer patterns with single-segment `*` wildcards.
//!
//! Used for field-level access lists: `/users/*/role` matches the `role`
//! field of every entry under `/users`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::util::{escape_component, parse_json_pointer};
use crate::validate::validate_json_pointer;
use crate::JsonPointerError;

const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Any,
    Key(String),
}

impl Segment {
    fn matches(&self, step: &str) -> bool {
        match self {
            Segment::Any => true,
            Segment::Key(key) => key == step,
        }
    }
}

/// A JSON Pointer in which a segment consisting of exactly `*` matches any
/// single path step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern from its pointer form.
    ///
    /// ```
    /// use json_sync_pointer::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/users/*/role").unwrap();
    /// assert!(pattern.covers(&["users".into(), "7".into(), "role".into()]));
    /// assert!(!pattern.covers(&["users".into(), "7".into(), "name".into()]));
    /// ```
    pub fn parse(pointer: &str) -> Result<Self, JsonPointerError> {
        validate_json_pointer(pointer)?;
        let segments = parse_json_pointer(pointer)
            .into_iter()
            .map(|step| {
                if step == WILDCARD {
                    Segment::Any
                } else {
                    Segment::Key(step)
                }
            })
            .collect();
        Ok(Self { segments })
    }

    /// Number of segments in the pattern.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `path` is matched by the pattern or lies below a match.
    pub fn covers(&self, path: &[String]) -> bool {
        path.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(segment, step)| segment.matches(step))
    }

    /// True when `path` is covered by the pattern, or writing `path` would
    /// replace a location the pattern matches (path is an ancestor of a match).
    pub fn overlaps(&self, path: &[String]) -> bool {
        if self.covers(path) {
            return true;
        }
        path.len() < self.segments.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(segment, step)| segment.matches(step))
    }
}

impl FromStr for PathPattern {
    type Err = JsonPointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathPattern::parse(s)
    }
}

impl TryFrom<String> for PathPattern {
    type Error = JsonPointerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PathPattern::parse(&value)
    }
}

impl From<PathPattern> for String {
    fn from(pattern: PathPattern) -> Self {
        pattern.to_string()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str("/")?;
            match segment {
                Segment::Any => f.write_str(WILDCARD)?,
                Segment::Key(key) => f.write_str(&escape_component(key))?,
            }
        }
        Ok(())
    }
}
