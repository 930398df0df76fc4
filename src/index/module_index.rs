//! Module name lookups.

use std::fmt;

use smol_str::SmolStr;

use crate::base::{FileId, ModuleName, ProjectId};
use crate::resolve::ResolutionFailure;

/// One identifier declared or re-exported by a module.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModuleIdentifier {
    pub module: ModuleName,
    pub name: SmolStr,
}

impl ModuleIdentifier {
    pub fn new(module: ModuleName, name: impl Into<SmolStr>) -> Self {
        Self {
            module,
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Maps module names to the files declaring them, scoped to one project.
///
/// Covers project sources and the library sources unpacked for the
/// project's dependency set.
pub trait ModuleIndex: Send + Sync {
    /// Files declaring `module`, project sources first.
    ///
    /// Fails with [`ResolutionFailure::IndexNotReady`] while the index
    /// is (re)building and [`ResolutionFailure::ModuleUnavailable`] when
    /// the module is known to be outside the project's dependency set.
    fn files_of_module(
        &self,
        project: ProjectId,
        module: &ModuleName,
    ) -> Result<Vec<FileId>, ResolutionFailure>;

    /// Cached identifier list of a library module, `None` when the index
    /// has no entry for it. Callers fall back to re-deriving the list
    /// from the module's files.
    fn library_module_identifiers(
        &self,
        project: ProjectId,
        module: &ModuleName,
    ) -> Option<Vec<ModuleIdentifier>>;
}
