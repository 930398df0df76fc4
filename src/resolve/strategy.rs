//! Strategy selection and the three resolution strategies.
//!
//! One reference, three ways to find its definition:
//!
//! - **Repl** asks the interactive session, the ground truth for loaded
//!   project code.
//! - **Info** asks the identifier info index and follows the defining
//!   module it names.
//! - **Imported** walks the modules imported by the reference's file and
//!   picks the ones exporting the name.
//!
//! Which strategies run, and in which order, is decided by the
//! [`DISPATCH`] table from the reference's shape alone. Strategies are
//! tried in order; the first success wins and the last failure is
//! reported when none succeeds.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::base::{Cancelled, FileId, ModuleName, ProjectId, checkpoint, is_constructor_like};
use crate::index::{ModuleIndex, NameInfoService};
use crate::repl::{ReplClient, SessionRegistry};
use crate::resolve::output::{AnswerContext, parse_location_answer};
use crate::resolve::{DefinitionLocation, Resolution, ResolutionFailure};
use crate::tree::{FileRole, ReferenceKey, SourceTree, synchronized_read};

/// Behavior knobs for resolution and cache waiting.
#[derive(Clone, Debug)]
pub struct ResolveOptions {
    /// Module excluded from import candidates unless it is the only one
    /// exporting the name.
    pub prelude_module: ModuleName,
    /// Accept a stderr line as a location answer when stdout is empty.
    /// Compatibility shim for session versions that print there.
    pub accept_stderr_output: bool,
    /// How often a lookup waiting on another thread's computation
    /// rechecks its own cancellation token.
    pub wait_poll: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            prelude_module: ModuleName::new("Prelude"),
            accept_stderr_output: true,
            wait_poll: Duration::from_millis(25),
        }
    }
}

/// The three resolution strategies, in dispatchable form.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    Repl,
    Info,
    Imported,
}

/// Shape facts about one reference, gathered once before dispatch.
#[derive(Clone, Debug)]
struct ReferenceShape {
    /// Identifier text with any qualification stripped.
    base: SmolStr,
    /// Effective qualifier, explicit or written.
    qualifier: Option<SmolStr>,
    in_library_file: bool,
    constructor: bool,
}

impl ReferenceShape {
    fn qualified(&self) -> bool {
        self.qualifier.is_some()
    }
}

struct DispatchRule {
    applies: fn(&ReferenceShape) -> bool,
    order: &'static [Strategy],
}

/// Strategy precedence, first matching row wins.
///
/// Library code and qualified names are invisible to the session, so
/// those rows skip it entirely. Constructor-shaped names share a
/// definition site with their type and resolve better through the info
/// index. Everything else asks the session first.
const DISPATCH: &[DispatchRule] = &[
    DispatchRule {
        applies: |shape| shape.in_library_file || shape.qualified(),
        order: &[Strategy::Info, Strategy::Imported],
    },
    DispatchRule {
        applies: |shape| shape.constructor,
        order: &[Strategy::Info, Strategy::Imported],
    },
    DispatchRule {
        applies: |_| true,
        order: &[Strategy::Repl, Strategy::Imported],
    },
];

fn strategy_order(shape: &ReferenceShape) -> &'static [Strategy] {
    DISPATCH
        .iter()
        .find(|rule| (rule.applies)(shape))
        .map_or(&[], |rule| rule.order)
}

/// Runs the strategy chain for one reference.
///
/// Holds only shared collaborators; one resolver serves every project
/// and every thread.
pub struct DefinitionResolver {
    tree: Arc<dyn SourceTree>,
    repl: Arc<dyn ReplClient>,
    names: Arc<dyn NameInfoService>,
    modules: Arc<dyn ModuleIndex>,
    sessions: Arc<SessionRegistry>,
    options: ResolveOptions,
}

impl DefinitionResolver {
    pub fn new(
        tree: Arc<dyn SourceTree>,
        repl: Arc<dyn ReplClient>,
        names: Arc<dyn NameInfoService>,
        modules: Arc<dyn ModuleIndex>,
        sessions: Arc<SessionRegistry>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            tree,
            repl,
            names,
            modules,
            sessions,
            options,
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn tree(&self) -> &Arc<dyn SourceTree> {
        &self.tree
    }

    /// Resolve `key` by running its strategy chain.
    ///
    /// `Err(Cancelled)` aborts between externally observable steps; a
    /// completed chain always yields a cacheable [`Resolution`].
    pub fn resolve(
        &self,
        project: ProjectId,
        key: &ReferenceKey,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        checkpoint(token)?;
        let shape = self.reference_shape(key);
        let order = strategy_order(&shape);
        tracing::debug!(name = %key.name, ?order, "resolving reference");

        let mut last: Option<ResolutionFailure> = None;
        for strategy in order {
            checkpoint(token)?;
            let attempt = match strategy {
                Strategy::Repl => self.resolve_via_repl(project, key, &shape, token)?,
                Strategy::Info => self.resolve_via_info(project, key, &shape, token)?,
                Strategy::Imported => self.resolve_via_imports(project, key, &shape, token)?,
            };
            match attempt {
                Ok(location) => return Ok(Ok(location)),
                Err(failure) => {
                    tracing::debug!(?strategy, %failure, "strategy failed");
                    last = Some(failure);
                }
            }
        }
        Ok(Err(last.unwrap_or_else(|| {
            ResolutionFailure::no_info(shape.base.clone(), key.file)
        })))
    }

    fn reference_shape(&self, key: &ReferenceKey) -> ReferenceShape {
        let base = SmolStr::new(key.base_name());
        // role probe failures dispatch as project code
        let in_library_file = matches!(self.tree.file_role(key.file), Ok(FileRole::Library));
        ReferenceShape {
            constructor: is_constructor_like(&base),
            qualifier: key.effective_qualifier().map(SmolStr::new),
            base,
            in_library_file,
        }
    }

    fn resolve_via_repl(
        &self,
        project: ProjectId,
        key: &ReferenceKey,
        shape: &ReferenceShape,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        let Some(session) = self.sessions.get(project) else {
            return Ok(Err(ResolutionFailure::ReplUnavailable));
        };
        if !self.repl.available(&session) {
            return Ok(Err(ResolutionFailure::ReplUnavailable));
        }

        let span = synchronized_read(self.tree.as_ref(), || {
            Ok::<_, ResolutionFailure>((
                self.tree.line_col(key.file, key.range.start())?,
                self.tree.line_col(key.file, key.range.end())?,
            ))
        });
        let (start, end) = match span {
            Ok((Some(start), Some(end))) => (start, end),
            // the reference's span no longer maps into the file
            Ok(_) => return Ok(Err(ResolutionFailure::no_info(shape.base.clone(), key.file))),
            Err(failure) => return Ok(Err(failure)),
        };

        checkpoint(token)?;
        let answer = self.repl.find_definition(&session, key.file, start, end, &shape.base);
        let Some(output) = answer else {
            return Ok(Err(ResolutionFailure::ReplUnavailable));
        };

        let line = match output.stdout.first() {
            Some(line) => line.clone(),
            None if self.options.accept_stderr_output => match output.stderr.first() {
                Some(line) => {
                    tracing::debug!("accepting stderr line as location answer");
                    line.clone()
                }
                None => return Ok(Err(ResolutionFailure::ReplUnavailable)),
            },
            None => return Ok(Err(ResolutionFailure::ReplUnavailable)),
        };

        checkpoint(token)?;
        let ctx = AnswerContext {
            tree: self.tree.as_ref(),
            modules: self.modules.as_ref(),
            project,
            origin: key.file,
        };
        let parsed = parse_location_answer(&line, &shape.base, &ctx);

        // An export-less answer still often names something declared in
        // the requesting file itself, e.g. a where-bound function.
        if matches!(parsed, Err(ResolutionFailure::NoMatchingExport)) {
            if let Ok(Some(location)) = self.in_file_search(key.file, &shape.base) {
                return Ok(Ok(location));
            }
        }
        Ok(parsed)
    }

    fn resolve_via_info(
        &self,
        project: ProjectId,
        key: &ReferenceKey,
        shape: &ReferenceShape,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        checkpoint(token)?;
        let candidates = match self.names.name_info(key) {
            Ok(candidates) => candidates,
            Err(failure) => return Ok(Err(failure)),
        };
        let Some(first) = candidates.into_iter().next() else {
            return Ok(Err(ResolutionFailure::no_info(shape.base.clone(), key.file)));
        };

        checkpoint(token)?;
        let attempt = match &first.defining_module {
            Some(module) => {
                self.locate_in_module(project, module, &shape.base, first.package.clone(), key.file)
            }
            None => self.in_file_search(key.file, &shape.base).and_then(|found| {
                found.ok_or_else(|| ResolutionFailure::no_info(shape.base.clone(), key.file))
            }),
        };
        match attempt {
            Ok(location) => Ok(Ok(location)),
            Err(cause) => {
                // the declaration is often right in the requesting file
                // even when the module lookup goes nowhere
                match self.in_file_search(key.file, &shape.base) {
                    Ok(Some(location)) => Ok(Ok(location)),
                    _ => Ok(Err(cause)),
                }
            }
        }
    }

    fn resolve_via_imports(
        &self,
        project: ProjectId,
        key: &ReferenceKey,
        shape: &ReferenceShape,
        token: &CancellationToken,
    ) -> Result<Resolution, Cancelled> {
        checkpoint(token)?;
        let candidates = synchronized_read(self.tree.as_ref(), || match &shape.qualifier {
            Some(qualifier) => self.tree.qualifier_binding(key.file, qualifier),
            None => self.tree.imported_modules(key.file),
        });
        let candidates: IndexSet<ModuleName> = match candidates {
            Ok(modules) => modules.into_iter().collect(),
            Err(error) => return Ok(Err(error.into())),
        };

        let mut exporters: Vec<ModuleName> = Vec::new();
        let mut membership_failure: Option<ResolutionFailure> = None;
        for module in &candidates {
            checkpoint(token)?;
            match self.module_exports_name(project, module, &shape.base) {
                Ok(true) => exporters.push(module.clone()),
                Ok(false) => {}
                Err(failure) => membership_failure = Some(failure),
            }
        }

        // Prelude is implicitly everywhere; honor it only when nothing
        // else exports the name.
        if exporters.len() > 1 {
            exporters.retain(|module| *module != self.options.prelude_module);
        }

        if exporters.is_empty() {
            return Ok(Err(
                membership_failure.unwrap_or(ResolutionFailure::NoMatchingExport)
            ));
        }

        let mut last = ResolutionFailure::NoMatchingExport;
        for module in exporters {
            checkpoint(token)?;
            match self.locate_in_module(project, &module, &shape.base, None, key.file) {
                Ok(location) => return Ok(Ok(location)),
                Err(failure) => last = failure,
            }
        }
        Ok(Err(last))
    }

    /// Find `name`'s declaration among the files of `module` and
    /// classify the hit by the file's role.
    fn locate_in_module(
        &self,
        project: ProjectId,
        module: &ModuleName,
        name: &str,
        package: Option<SmolStr>,
        origin: FileId,
    ) -> Result<DefinitionLocation, ResolutionFailure> {
        let files = self.modules.files_of_module(project, module)?;
        if files.is_empty() {
            return Err(ResolutionFailure::ModuleUnavailable(module.clone()));
        }
        synchronized_read(self.tree.as_ref(), || {
            for file in &files {
                if let Some(element) = self.tree.find_named_element(*file, name)? {
                    // role probe failures classify as project code
                    let location = match self.tree.file_role(*file).unwrap_or_default() {
                        FileRole::Library => {
                            DefinitionLocation::library(module.clone(), element, package.clone())
                        }
                        FileRole::Project => DefinitionLocation::local(element),
                    };
                    return Ok(location);
                }
            }
            Err(ResolutionFailure::no_info(name, origin))
        })
    }

    fn in_file_search(
        &self,
        file: FileId,
        name: &str,
    ) -> Result<Option<DefinitionLocation>, ResolutionFailure> {
        let element =
            synchronized_read(self.tree.as_ref(), || self.tree.find_named_element(file, name))?;
        Ok(element.map(DefinitionLocation::local))
    }

    /// Whether `module` exports `name`. Library modules answer from the
    /// cached identifier index when it has an entry; project modules and
    /// uncached library modules answer from the live tree.
    fn module_exports_name(
        &self,
        project: ProjectId,
        module: &ModuleName,
        name: &str,
    ) -> Result<bool, ResolutionFailure> {
        let files = self.modules.files_of_module(project, module)?;
        if files.is_empty() {
            return Ok(false);
        }

        let role = synchronized_read(self.tree.as_ref(), || self.tree.file_role(files[0]))
            .unwrap_or_default();
        if role == FileRole::Library {
            if let Some(identifiers) = self.modules.library_module_identifiers(project, module) {
                return Ok(identifiers.iter().any(|id| id.name == name));
            }
        }

        synchronized_read(self.tree.as_ref(), || {
            for file in &files {
                if self
                    .tree
                    .top_level_identifiers(*file)?
                    .iter()
                    .any(|declared| declared == name)
                {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }
}
