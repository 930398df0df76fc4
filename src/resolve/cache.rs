//! The per-project resolution cache.
//!
//! A loading cache with single-flight semantics: at most one thread
//! computes any given key while every concurrent caller for that key
//! waits and receives the same outcome. Entries are immutable once
//! stored; every invalidation path removes entries so the next lookup
//! recomputes, nothing is ever patched in place.
//!
//! Failure retention is asymmetric. Transient failures (session down,
//! index rebuilding) are stored so the in-flight stampede converges,
//! then evicted on the next read. Stable negatives (no matching export,
//! no info) stay until an explicit invalidation says the world changed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::base::{Cancelled, FileId, ProjectId, checkpoint};
use crate::resolve::Resolution;
use crate::resolve::strategy::DefinitionResolver;
use crate::tree::{ReferenceKey, SourceTree, is_live, probed, synchronized_read};

/// Atomic hit/miss/load/eviction counters.
#[derive(Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the counters.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Underlying strategy-chain computations. With single-flight this
    /// stays below the raw lookup count under contention.
    pub loads: u64,
    pub evictions: u64,
}

impl StatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One in-flight computation that waiters block on.
struct Flight {
    state: Mutex<FlightState>,
    done: Condvar,
}

enum FlightState {
    Running,
    Finished(Resolution),
    /// The computing thread was cancelled; waiters must recompute.
    Abandoned,
}

impl Flight {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Running),
            done: Condvar::new(),
        }
    }

    fn finish(&self, resolution: Resolution) {
        *self.state.lock() = FlightState::Finished(resolution);
        self.done.notify_all();
    }

    fn abandon(&self) {
        *self.state.lock() = FlightState::Abandoned;
        self.done.notify_all();
    }
}

enum Slot {
    InFlight(Arc<Flight>),
    Ready(Resolution),
}

enum Claim {
    Done(Resolution),
    Compute(Arc<Flight>),
    Wait(Arc<Flight>),
}

/// Resolution cache for one project session.
///
/// Owned per project; tearing the project down drops the instance and
/// with it every entry. Lookups are synchronous and safe from any
/// thread.
pub struct ResolutionCache {
    project: ProjectId,
    resolver: Arc<DefinitionResolver>,
    entries: Mutex<IndexMap<ReferenceKey, Slot>>,
    stats: CacheStats,
}

impl ResolutionCache {
    pub fn new(project: ProjectId, resolver: Arc<DefinitionResolver>) -> Self {
        Self {
            project,
            resolver,
            entries: Mutex::new(IndexMap::new()),
            stats: CacheStats::default(),
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Resolve `key`, from cache when possible.
    ///
    /// A stable cached outcome is returned without touching any
    /// collaborator. A cached transient failure is evicted and the key
    /// recomputed. On a miss the calling thread computes while
    /// concurrent callers of the same key wait for its result.
    pub fn lookup(
        &self,
        key: &ReferenceKey,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        loop {
            checkpoint(token)?;
            match self.claim(key) {
                Claim::Done(resolution) => return Ok(resolution),
                Claim::Compute(flight) => return self.compute(key, &flight, token),
                Claim::Wait(flight) => match self.wait(&flight, token)? {
                    Some(resolution) => return Ok(resolution),
                    // the computing thread was cancelled; take over
                    None => continue,
                },
            }
        }
    }

    fn claim(&self, key: &ReferenceKey) -> Claim {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(Slot::Ready(resolution)) => {
                if matches!(resolution, Err(failure) if failure.is_transient()) {
                    // transient answers are single-shot
                    tracing::debug!(name = %key.name, "evicting transient failure on read");
                    entries.swap_remove(key);
                    self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    let flight = Arc::new(Flight::new());
                    entries.insert(key.clone(), Slot::InFlight(flight.clone()));
                    Claim::Compute(flight)
                } else {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    Claim::Done(resolution.clone())
                }
            }
            Some(Slot::InFlight(flight)) => Claim::Wait(flight.clone()),
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                let flight = Arc::new(Flight::new());
                entries.insert(key.clone(), Slot::InFlight(flight.clone()));
                Claim::Compute(flight)
            }
        }
    }

    fn compute(
        &self,
        key: &ReferenceKey,
        flight: &Arc<Flight>,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        self.stats.loads.fetch_add(1, Ordering::Relaxed);
        let outcome = self
            .resolver
            .resolve(self.project, key, token)
            // a cache write is externally observable; a caller that is
            // already gone must not cause one
            .and_then(|resolution| checkpoint(token).map(|()| resolution));

        match outcome {
            Ok(resolution) => {
                {
                    let mut entries = self.entries.lock();
                    if let Some(Slot::InFlight(current)) = entries.get(key) {
                        if Arc::ptr_eq(current, flight) {
                            entries.insert(key.clone(), Slot::Ready(resolution.clone()));
                        }
                        // otherwise an invalidation removed or replaced
                        // the slot mid-computation; deliver the result
                        // but never resurrect the entry
                    }
                }
                flight.finish(resolution.clone());
                Ok(resolution)
            }
            Err(Cancelled) => {
                {
                    let mut entries = self.entries.lock();
                    if let Some(Slot::InFlight(current)) = entries.get(key) {
                        if Arc::ptr_eq(current, flight) {
                            entries.swap_remove(key);
                        }
                    }
                }
                flight.abandon();
                Err(Cancelled)
            }
        }
    }

    /// Wait for another thread's computation, polling our own token.
    ///
    /// `Ok(None)` means the flight was abandoned and the caller should
    /// claim the key again. A waiter's cancellation only abandons the
    /// wait; the computation itself keeps running.
    fn wait(
        &self,
        flight: &Flight,
        token: &CancellationToken,
    ) -> Result<Option<Resolution>, Cancelled> {
        let poll = self.resolver.options().wait_poll;
        let mut state = flight.state.lock();
        loop {
            match &*state {
                FlightState::Finished(resolution) => return Ok(Some(resolution.clone())),
                FlightState::Abandoned => return Ok(None),
                FlightState::Running => {
                    checkpoint(token)?;
                    flight.done.wait_for(&mut state, poll);
                }
            }
        }
    }

    /// Remove one entry.
    pub fn invalidate(&self, key: &ReferenceKey) {
        let removed = self.entries.lock().swap_remove(key);
        if matches!(removed, Some(Slot::Ready(_))) {
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove every entry. Project teardown path.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock();
        let ready = entries
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count() as u64;
        entries.clear();
        self.stats.evictions.fetch_add(ready, Ordering::Relaxed);
    }

    /// Remove entries referencing `file`, as key or as cached target.
    ///
    /// Called on document edits; the file's revision has moved, so keys
    /// for it are unreachable and targets in it are suspect.
    pub fn invalidate_file(&self, file: FileId) {
        let mut entries = self.entries.lock();
        let mut removed = 0u64;
        entries.retain(|key, slot| {
            let stale = key.file == file
                || matches!(slot, Slot::Ready(Ok(location)) if location.file() == file);
            if stale && matches!(slot, Slot::Ready(_)) {
                removed += 1;
            }
            !stale
        });
        if removed > 0 {
            tracing::debug!(%file, removed, "invalidated entries for edited file");
            self.stats.evictions.fetch_add(removed, Ordering::Relaxed);
        }
    }

    /// Remove stable negatives whose key still points at live code.
    ///
    /// Called when the environment changed in a way that could turn a
    /// "not found" into a hit, e.g. a session restart after adding a
    /// dependency. Positives stay; negatives under dead keys are
    /// unreachable by future lookups and are left for the sweep.
    pub fn invalidate_not_found(&self) {
        let tree = self.resolver.tree().clone();
        let mut stale: Vec<ReferenceKey> = {
            self.entries
                .lock()
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready(Err(failure)) if !failure.is_transient() => Some(key.clone()),
                    _ => None,
                })
                .collect()
        };
        if stale.is_empty() {
            return;
        }

        synchronized_read(tree.as_ref(), || {
            stale.retain(|key| self.key_is_live(tree.as_ref(), key));
        });

        let mut entries = self.entries.lock();
        for key in &stale {
            if matches!(entries.get(key), Some(Slot::Ready(Err(failure))) if !failure.is_transient())
            {
                entries.swap_remove(key);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Evict entries that no longer describe the tree.
    ///
    /// One synchronized read covers all probes so every entry is judged
    /// against the same tree state. An entry is evicted when its key's
    /// revision is gone, its target element died, or the target's
    /// display name no longer matches what was resolved.
    pub fn sweep_consistency(&self) {
        let tree = self.resolver.tree().clone();
        let snapshot: Vec<(ReferenceKey, Resolution)> = {
            self.entries
                .lock()
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready(resolution) => Some((key.clone(), resolution.clone())),
                    Slot::InFlight(_) => None,
                })
                .collect()
        };
        if snapshot.is_empty() {
            return;
        }

        let mut dead: Vec<(ReferenceKey, Resolution)> = Vec::new();
        synchronized_read(tree.as_ref(), || {
            for (key, resolution) in &snapshot {
                if !self.entry_is_consistent(tree.as_ref(), key, resolution) {
                    dead.push((key.clone(), resolution.clone()));
                }
            }
        });
        if dead.is_empty() {
            return;
        }

        let mut entries = self.entries.lock();
        let mut removed = 0u64;
        for (key, resolution) in &dead {
            // only evict what the sweep actually judged
            if matches!(entries.get(key), Some(Slot::Ready(current)) if current == resolution) {
                entries.swap_remove(key);
                removed += 1;
            }
        }
        self.stats.evictions.fetch_add(removed, Ordering::Relaxed);
        tracing::debug!(evicted = removed, "consistency sweep finished");
    }

    fn key_is_live(&self, tree: &dyn SourceTree, key: &ReferenceKey) -> bool {
        is_live(
            tree.file_revision(key.file)
                .map(|current| current == Some(key.revision)),
        )
    }

    fn entry_is_consistent(
        &self,
        tree: &dyn SourceTree,
        key: &ReferenceKey,
        resolution: &Resolution,
    ) -> bool {
        if !self.key_is_live(tree, key) {
            return false;
        }
        // failures carry no target; a live key keeps them
        let Ok(location) = resolution else {
            return true;
        };
        let Some(current) = probed(tree.element_display_name(location.element())) else {
            return false;
        };
        current == key.base_name() && current == location.original_name()
    }
}
