//! Foundation types for the hsnav resolution core.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`], [`FileRevision`], [`ProjectId`] - Versioned identity handles
//! - [`TextRange`], [`TextSize`] - Source positions
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`ModuleName`] - Haskell module names and lexical shape helpers
//! - [`Cancelled`], [`checkpoint`] - Cooperative cancellation
//!
//! This module has NO dependencies on other hsnav modules.

mod cancel;
mod ids;
mod names;
mod span;

pub use cancel::{Cancelled, checkpoint};
pub use ids::{FileId, FileRevision, ProjectId};
pub use names::{ModuleName, is_constructor_like, split_qualified};
pub use span::{LineCol, LineIndex, TextRange, TextSize};

// Re-export for downstream callers that drive cancellation
pub use tokio_util::sync::CancellationToken;
