//! Identifier info lookups.

use smol_str::SmolStr;

use crate::base::ModuleName;
use crate::resolve::ResolutionFailure;
use crate::tree::ReferenceKey;

/// What the editor's indices know about one identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NameInfo {
    pub name: SmolStr,
    /// Type signature when the index has one, verbatim.
    pub signature: Option<SmolStr>,
    /// Module the identifier is defined in, when known.
    pub defining_module: Option<ModuleName>,
    /// Package the defining module ships in, for library identifiers.
    pub package: Option<SmolStr>,
}

impl NameInfo {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            signature: None,
            defining_module: None,
            package: None,
        }
    }

    pub fn with_module(mut self, module: ModuleName) -> Self {
        self.defining_module = Some(module);
        self
    }

    pub fn with_package(mut self, package: impl Into<SmolStr>) -> Self {
        self.package = Some(package.into());
        self
    }
}

/// Index-backed lookup of identifier info, ordered best match first.
///
/// Answers come from the editor's identifier indices, not from the
/// interactive session, so they are available for library code the
/// session never loaded.
pub trait NameInfoService: Send + Sync {
    fn name_info(&self, key: &ReferenceKey) -> Result<Vec<NameInfo>, ResolutionFailure>;
}
