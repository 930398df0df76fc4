//! The resolution result model.
//!
//! A resolution either lands on a [`DefinitionLocation`] or explains
//! itself with a [`ResolutionFailure`]. Both sides are plain data, cheap
//! to clone, safe to hold across tree mutations, and carry everything
//! the cache's consistency checks need.

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::{FileId, ModuleName};
use crate::tree::ElementPtr;

/// A definition found in a module addressed by name, typically library
/// code the project does not own.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LibraryLocation {
    pub module: ModuleName,
    pub element: ElementPtr,
    /// Display name of the definition at resolve time.
    pub original_name: SmolStr,
    /// Package the module ships in, when the session reported one.
    pub package: Option<SmolStr>,
}

/// A definition found in a project file addressed directly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocalLocation {
    pub file: FileId,
    pub element: ElementPtr,
    /// Display name of the definition at resolve time.
    pub original_name: SmolStr,
}

/// Where an identifier is defined.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DefinitionLocation {
    Library(LibraryLocation),
    Local(LocalLocation),
}

impl DefinitionLocation {
    /// Build a [`LocalLocation`] from a freshly probed element.
    pub fn local(element: ElementPtr) -> Self {
        Self::Local(LocalLocation {
            file: element.file,
            original_name: element.name.clone(),
            element,
        })
    }

    /// Build a [`LibraryLocation`] from a freshly probed element.
    pub fn library(module: ModuleName, element: ElementPtr, package: Option<SmolStr>) -> Self {
        Self::Library(LibraryLocation {
            module,
            original_name: element.name.clone(),
            element,
            package,
        })
    }

    pub fn element(&self) -> &ElementPtr {
        match self {
            Self::Library(loc) => &loc.element,
            Self::Local(loc) => &loc.element,
        }
    }

    pub fn original_name(&self) -> &str {
        match self {
            Self::Library(loc) => &loc.original_name,
            Self::Local(loc) => &loc.original_name,
        }
    }

    /// File the definition lives in.
    pub fn file(&self) -> FileId {
        match self {
            Self::Library(loc) => loc.element.file,
            Self::Local(loc) => loc.file,
        }
    }
}

impl fmt::Display for DefinitionLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library(loc) => {
                write!(f, "{}.{}", loc.module, loc.original_name)?;
                if let Some(package) = &loc.package {
                    write!(f, " ({package})")?;
                }
                Ok(())
            }
            Self::Local(loc) => write!(f, "{} in {}", loc.original_name, loc.file),
        }
    }
}

/// Why a resolution produced no location.
///
/// Transient failures describe a momentarily unusable environment and
/// are worth retrying; the cache evicts them on the next read. Stable
/// failures are real answers about the code and stay cached until an
/// explicit invalidation.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ResolutionFailure {
    #[error("interactive session did not answer in time")]
    Timeout,
    #[error("identifier index is still being built")]
    IndexNotReady,
    #[error("module {0} is not available in this project")]
    ModuleUnavailable(ModuleName),
    #[error("no interactive session available")]
    ReplUnavailable,
    #[error("no matching export in the imported modules")]
    NoMatchingExport,
    #[error("no definition information for `{name}`")]
    NoInfoAvailable { name: SmolStr, file: FileId },
}

impl ResolutionFailure {
    pub fn no_info(name: impl Into<SmolStr>, file: FileId) -> Self {
        Self::NoInfoAvailable {
            name: name.into(),
            file,
        }
    }

    /// Whether the failure describes the environment rather than the
    /// code, and should be retried instead of served from cache.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout
            | Self::IndexNotReady
            | Self::ModuleUnavailable(_)
            | Self::ReplUnavailable => true,
            Self::NoMatchingExport | Self::NoInfoAvailable { .. } => false,
        }
    }
}

impl From<crate::tree::ProbeError> for ResolutionFailure {
    /// A failed probe means the tree or its indices were not stable
    /// enough to answer. Surfacing that as transient makes the cache
    /// retry instead of pinning a wrong negative.
    fn from(error: crate::tree::ProbeError) -> Self {
        match error {
            crate::tree::ProbeError::IndexNotReady
            | crate::tree::ProbeError::ConcurrentMutation
            | crate::tree::ProbeError::DetachedElement => Self::IndexNotReady,
        }
    }
}

/// The cacheable outcome of one resolution.
pub type Resolution = Result<DefinitionLocation, ResolutionFailure>;
