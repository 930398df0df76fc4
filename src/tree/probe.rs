//! Probe failures and the single fail-safe collapse point.

use thiserror::Error;

/// A source tree probe could not produce an answer.
///
/// The tree is mutated concurrently by the editor; probes observe that
/// as recoverable errors rather than panics.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ProbeError {
    /// The tree changed while the probe was reading it.
    #[error("source tree mutated during probe")]
    ConcurrentMutation,
    /// The handle points at a node that no longer exists.
    #[error("element handle is detached")]
    DetachedElement,
    /// The backing identifier index is still (re)building.
    #[error("identifier index not ready")]
    IndexNotReady,
}

/// Collapse a fallible liveness probe to a plain answer.
///
/// Liveness checks guard eviction: when the probe itself fails, the
/// probed handle cannot be trusted, so it counts as dead and the entry
/// is evicted rather than served. This function and [`probed`] are the
/// only places probe errors are swallowed; resolution paths that need
/// the error keep the `Result`.
pub fn is_live(probe: Result<bool, ProbeError>) -> bool {
    match probe {
        Ok(live) => live,
        Err(error) => {
            tracing::debug!(%error, "liveness probe failed, treating handle as dead");
            false
        }
    }
}

/// [`is_live`] for probes that answer with a value instead of a flag.
pub fn probed<T>(probe: Result<Option<T>, ProbeError>) -> Option<T> {
    match probe {
        Ok(value) => value,
        Err(error) => {
            tracing::debug!(%error, "probe failed, treating handle as dead");
            None
        }
    }
}
