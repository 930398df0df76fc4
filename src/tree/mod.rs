//! The source tree boundary.
//!
//! The editor owns a mutable, language-aware source tree; this crate only
//! ever reads it. [`SourceTree`] is the read-side contract: synchronized
//! access, liveness and name probes for cached handles, and the import
//! queries the resolver needs. [`ElementPtr`] and [`ReferenceKey`] are
//! the structural handles that cross the boundary instead of live tree
//! objects.

mod element;
mod probe;
mod source_tree;

pub use element::{ElementPtr, ReferenceKey};
pub use probe::{ProbeError, is_live, probed};
pub use source_tree::{FileRole, SourceTree, synchronized_read};
