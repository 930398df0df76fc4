//! # hsnav-base
//!
//! Core library for REPL-backed Haskell definition resolution: a
//! multi-strategy resolver over an interactive compiler session, output
//! parsing, and a single-flight resolution cache with incremental
//! invalidation.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide      → NavHost façade: per-project cache sessions
//!   ↓
//! resolve  → cache, strategies, session output parsing
//!   ↓
//! index    → module / name-info lookup boundary (traits)
//! repl     → interactive session boundary (traits)
//! tree     → source tree boundary: liveness, elements
//!   ↓
//! base     → primitives (ids, positions, names, cancellation)
//! ```
//!
//! The source tree, the module indices, and the session process are all
//! owned by the embedding editor and consumed through traits; this
//! crate contributes the resolution semantics on top of them.

/// Foundation types: identity handles, positions, names, cancellation
pub mod base;

/// Consumed lookup services: module index, identifier info
pub mod index;

/// Interactive session boundary: session identity, query client
pub mod repl;

/// Definition resolution: locations, parsing, strategies, cache
pub mod resolve;

/// Source tree boundary: synchronized reads, probes, handles
pub mod tree;

/// IDE entry points: the NavHost façade
pub mod ide;

// Re-export the types almost every consumer needs
pub use base::{CancellationToken, Cancelled, FileId, FileRevision, LineCol, ProjectId};
pub use ide::NavHost;
pub use resolve::{DefinitionLocation, Resolution, ResolutionFailure, ResolveOptions};
pub use tree::{ElementPtr, ReferenceKey};
