//! Cooperative cancellation for long-running resolution calls.
//!
//! Resolution runs on background worker threads while the editor keeps
//! moving; a navigation action that is no longer wanted signals its
//! [`CancellationToken`] and the worker stops at the next checkpoint.

use std::fmt;

use tokio_util::sync::CancellationToken;

/// The caller abandoned the request before a result was produced.
///
/// Cancellation is an outcome distinct from resolution failure: it says
/// nothing about the identifier and must never be cached.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Returns `Err(Cancelled)` once `token` has been cancelled.
///
/// Called before every externally observable step (session queries, index
/// lookups, cache writes) so an abandoned request stops at the next
/// checkpoint instead of running to completion.
#[inline]
pub fn checkpoint(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}
