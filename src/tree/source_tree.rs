//! Read-side contract with the editor's mutable source tree.

use smol_str::SmolStr;

use crate::base::{FileId, FileRevision, LineCol, ModuleName, TextSize};
use crate::tree::{ElementPtr, ProbeError};

/// Whether a file belongs to the project's own sources or to a library
/// dependency unpacked alongside it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum FileRole {
    #[default]
    Project,
    Library,
}

/// Read access to the source tree.
///
/// Implementations are supplied by the embedding editor. All probes may
/// fail with [`ProbeError`] because the tree is mutated concurrently;
/// callers either propagate the error or collapse it at the documented
/// sites in [`crate::tree::probe`].
///
/// `Option` answers mean the question was understood but has no subject:
/// the file is gone, the offset is past the end, no element of that name
/// exists. They are not errors.
pub trait SourceTree: Send + Sync {
    /// Run `action` while the tree is guaranteed not to be mutated.
    ///
    /// Probes issued outside a synchronized read may observe the tree
    /// mid-mutation and fail spuriously; multi-probe sequences that must
    /// see one consistent tree state always run inside one.
    /// Implementations invoke `action` exactly once.
    fn run_synchronized_read(&self, action: &mut dyn FnMut());

    /// Current revision of `file`, or `None` when the file left the tree.
    fn file_revision(&self, file: FileId) -> Result<Option<FileRevision>, ProbeError>;

    /// Project or library classification for `file`.
    fn file_role(&self, file: FileId) -> Result<FileRole, ProbeError>;

    /// Look a file up by the path the interactive session printed.
    fn file_by_path(&self, path: &str) -> Result<Option<FileId>, ProbeError>;

    /// Convert a byte offset in `file` to a line/column position.
    fn line_col(&self, file: FileId, offset: TextSize) -> Result<Option<LineCol>, ProbeError>;

    /// The named element whose declaration starts exactly at `at`.
    fn named_element_at(
        &self,
        file: FileId,
        at: LineCol,
        name: &str,
    ) -> Result<Option<ElementPtr>, ProbeError>;

    /// The first top-level declaration of `name` in `file`.
    fn find_named_element(
        &self,
        file: FileId,
        name: &str,
    ) -> Result<Option<ElementPtr>, ProbeError>;

    /// Current display name of the declaration `element` points at, or
    /// `None` when the element no longer exists.
    fn element_display_name(&self, element: &ElementPtr) -> Result<Option<SmolStr>, ProbeError>;

    /// Names of all top-level declarations in `file`.
    fn top_level_identifiers(&self, file: FileId) -> Result<Vec<SmolStr>, ProbeError>;

    /// Modules whose exports are in scope in `file` through its imports.
    fn imported_modules(&self, file: FileId) -> Result<Vec<ModuleName>, ProbeError>;

    /// Modules a written qualifier binds to in `file`, e.g. `M` from
    /// `import qualified Data.Map as M`. Empty when the qualifier is not
    /// bound.
    fn qualifier_binding(
        &self,
        file: FileId,
        qualifier: &str,
    ) -> Result<Vec<ModuleName>, ProbeError>;
}

/// Run `f` under the tree's synchronized read and return its value.
///
/// [`SourceTree::run_synchronized_read`] takes a plain `FnMut` to stay
/// object safe; this wrapper restores the closure-with-result form the
/// call sites want.
pub fn synchronized_read<T>(tree: &dyn SourceTree, f: impl FnOnce() -> T) -> T {
    let mut f = Some(f);
    let mut slot = None;
    tree.run_synchronized_read(&mut || {
        if let Some(f) = f.take() {
            slot = Some(f());
        }
    });
    slot.expect("source tree did not run the read action")
}
