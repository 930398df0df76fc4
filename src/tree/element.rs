//! Structural handles into the source tree.
//!
//! Neither type holds a live tree object. Both capture the file, the
//! revision the handle was minted against, and enough text to re-identify
//! the node; the tree is probed through [`crate::tree::SourceTree`] when
//! a handle needs to be checked or followed.

use smol_str::SmolStr;

use crate::base::{FileId, FileRevision, TextRange, split_qualified};

/// One identifier reference in one revision of one file.
///
/// This is the resolution cache key. Equality and hashing are structural;
/// two requests for the same identifier occurrence in the same revision
/// collapse onto one cache entry, and any edit to the file makes every
/// key minted for the old revision unreachable.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReferenceKey {
    pub file: FileId,
    pub revision: FileRevision,
    /// Byte range of the reference text within the file.
    pub range: TextRange,
    /// The identifier as written, possibly still module-qualified.
    pub name: SmolStr,
    /// Import qualifier supplied by the caller, when the reference site
    /// alone does not carry it (e.g. navigation from an import list).
    pub qualifier: Option<SmolStr>,
}

impl ReferenceKey {
    /// The identifier text with any written qualification stripped.
    ///
    /// `"M.lookup"` yields `"lookup"`; an unqualified name is returned
    /// unchanged.
    pub fn base_name(&self) -> &str {
        match split_qualified(&self.name) {
            Some((_, base)) => base,
            None => &self.name,
        }
    }

    /// The effective qualifier: the explicit one when given, otherwise
    /// whatever qualification is written in the reference text itself.
    pub fn effective_qualifier(&self) -> Option<&str> {
        match &self.qualifier {
            Some(q) => Some(q.as_str()),
            None => split_qualified(&self.name).map(|(q, _)| q),
        }
    }
}

/// A resolved named declaration, addressed structurally.
///
/// `name` is the declaration's display name at the time the handle was
/// minted; the consistency sweep compares it against the tree's current
/// answer to catch renames.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementPtr {
    pub file: FileId,
    pub revision: FileRevision,
    pub range: TextRange,
    pub name: SmolStr,
}
