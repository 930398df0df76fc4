//! IDE entry points: the high-level API for editor actions.
//!
//! Editor glue talks to [`NavHost`] and nothing deeper: it owns the
//! per-project caches, the session registry, and the resolver they
//! share. Each method corresponds to one editor-side event (a
//! navigation request, an edit, a session restart, a project close).
//!
//! ## Usage
//!
//! ```ignore
//! use hsnav::ide::NavHost;
//!
//! let host = NavHost::new(tree, repl, names, modules, options);
//! host.attach_session(session);
//!
//! let outcome = host.goto_definition(project, &key, &token)?;
//! ```

mod host;

pub use host::NavHost;
