//! Field-level access lists.

use json_sync_pointer::{format_json_pointer, PathPattern};

use crate::json_patch::Op;

use super::{SyncError, SyncableOptions};

/// Which paths a replica accepts writes to.
///
/// With a whitelist, a path must lie at or under one of its patterns. A
/// blacklisted pattern forbids the path it matches, everything under it, and
/// every ancestor write that would replace it.
#[derive(Debug, Clone, Default)]
pub struct AccessList {
    whitelist: Option<Vec<PathPattern>>,
    blacklist: Option<Vec<PathPattern>>,
}

impl AccessList {
    pub fn new(whitelist: Option<Vec<PathPattern>>, blacklist: Option<Vec<PathPattern>>) -> Self {
        Self {
            whitelist,
            blacklist,
        }
    }

    pub fn from_options(options: &SyncableOptions) -> Self {
        Self::new(options.whitelist.clone(), options.blacklist.clone())
    }

    pub fn allows(&self, path: &[String]) -> bool {
        if let Some(white) = &self.whitelist {
            if !white.iter().any(|pattern| pattern.covers(path)) {
                return false;
            }
        }
        match &self.blacklist {
            Some(black) => !black.iter().any(|pattern| pattern.overlaps(path)),
            None => true,
        }
    }

    /// Check both paths of `op`.
    pub fn check(&self, op: &Op) -> Result<(), SyncError> {
        for path in std::iter::once(&op.path).chain(op.from.as_ref()) {
            if !self.allows(path) {
                return Err(SyncError::Forbidden(format_json_pointer(path)));
            }
        }
        Ok(())
    }
}
