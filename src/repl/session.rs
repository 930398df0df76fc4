//! Session identity and the per-project session registry.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::base::ProjectId;

/// Handle for one live interactive session.
///
/// The id is minted fresh every time the embedder (re)starts a session,
/// so a query addressed to a session that has since been restarted can
/// be recognized and refused instead of silently hitting the new
/// process with stale positions.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ReplSession {
    id: Uuid,
    project: ProjectId,
}

impl ReplSession {
    pub fn new(project: ProjectId) -> Self {
        Self {
            id: Uuid::new_v4(),
            project,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn project(&self) -> ProjectId {
        self.project
    }
}

impl fmt::Debug for ReplSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReplSession({} @ {})", self.id, self.project)
    }
}

/// Tracks the current session of each project.
///
/// The embedder registers a session after it reaches a usable load
/// state and clears it on shutdown. A project without a registered
/// session simply resolves without the interactive strategy.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<FxHashMap<ProjectId, ReplSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` as the project's current session, returning
    /// the one it replaced.
    pub fn set(&self, session: ReplSession) -> Option<ReplSession> {
        self.sessions.write().insert(session.project(), session)
    }

    pub fn clear(&self, project: ProjectId) -> Option<ReplSession> {
        self.sessions.write().remove(&project)
    }

    pub fn get(&self, project: ProjectId) -> Option<ReplSession> {
        self.sessions.read().get(&project).cloned()
    }
}
