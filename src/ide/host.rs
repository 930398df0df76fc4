//! The navigation host: per-project caches over one shared resolver.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use crate::base::{Cancelled, FileId, ProjectId};
use crate::index::{ModuleIndex, NameInfoService};
use crate::repl::{ReplClient, ReplSession, SessionRegistry};
use crate::resolve::{
    DefinitionResolver, Resolution, ResolutionCache, ResolveOptions, StatsSnapshot,
};
use crate::tree::{ReferenceKey, SourceTree};

/// Owns the resolver, the session registry, and one [`ResolutionCache`]
/// per open project.
///
/// Caches are created lazily on first use and dropped with
/// [`NavHost::drop_project`]; nothing outlives its project session.
pub struct NavHost {
    resolver: Arc<DefinitionResolver>,
    sessions: Arc<SessionRegistry>,
    caches: RwLock<FxHashMap<ProjectId, Arc<ResolutionCache>>>,
}

impl NavHost {
    pub fn new(
        tree: Arc<dyn SourceTree>,
        repl: Arc<dyn ReplClient>,
        names: Arc<dyn NameInfoService>,
        modules: Arc<dyn ModuleIndex>,
        options: ResolveOptions,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let resolver = Arc::new(DefinitionResolver::new(
            tree,
            repl,
            names,
            modules,
            sessions.clone(),
            options,
        ));
        Self {
            resolver,
            sessions,
            caches: RwLock::new(FxHashMap::default()),
        }
    }

    /// Resolve one reference through the project's cache.
    pub fn goto_definition(
        &self,
        project: ProjectId,
        key: &ReferenceKey,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        self.project_cache(project).lookup(key, token)
    }

    /// The project's cache, created on first use.
    pub fn project_cache(&self, project: ProjectId) -> Arc<ResolutionCache> {
        if let Some(cache) = self.caches.read().get(&project) {
            return cache.clone();
        }
        let mut caches = self.caches.write();
        caches
            .entry(project)
            .or_insert_with(|| Arc::new(ResolutionCache::new(project, self.resolver.clone())))
            .clone()
    }

    /// Register a freshly started interactive session.
    ///
    /// A new session may answer what the old one could not, so stable
    /// negatives for the project are invalidated.
    pub fn attach_session(&self, session: ReplSession) {
        let project = session.project();
        self.sessions.set(session);
        if let Some(cache) = self.existing_cache(project) {
            cache.invalidate_not_found();
        }
    }

    /// Forget the project's session; lookups needing it fail transient
    /// until a new one is attached.
    pub fn detach_session(&self, project: ProjectId) {
        self.sessions.clear(project);
    }

    /// A document was edited: drop entries keyed by it or landing in it.
    pub fn file_changed(&self, project: ProjectId, file: FileId) {
        if let Some(cache) = self.existing_cache(project) {
            cache.invalidate_file(file);
        }
    }

    /// Run a consistency sweep over the project's cache.
    pub fn sweep_project(&self, project: ProjectId) {
        if let Some(cache) = self.existing_cache(project) {
            cache.sweep_consistency();
        }
    }

    /// Tear the project down: session and cache are dropped together.
    pub fn drop_project(&self, project: ProjectId) {
        self.sessions.clear(project);
        self.caches.write().remove(&project);
    }

    pub fn project_stats(&self, project: ProjectId) -> Option<StatsSnapshot> {
        self.existing_cache(project).map(|cache| cache.stats())
    }

    fn existing_cache(&self, project: ProjectId) -> Option<Arc<ResolutionCache>> {
        self.caches.read().get(&project).cloned()
    }
}
