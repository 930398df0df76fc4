//! Parsing of location answers from the interactive session.
//!
//! The session answers location queries with a single unstructured text
//! line. The recognized shapes below are a textual contract with the
//! session version; when an answer matches none of them the protocol has
//! drifted, which is logged for operators and reported as a plain
//! lookup failure to the user.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use smol_str::SmolStr;

use crate::base::{FileId, LineCol, ModuleName, ProjectId};
use crate::index::ModuleIndex;
use crate::resolve::{DefinitionLocation, Resolution, ResolutionFailure};
use crate::tree::{SourceTree, synchronized_read};

/// `path:(l1,c1)-(l2,c2)`, the span answer for loaded project code.
static SPAN_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+):\((?P<l1>\d+),(?P<c1>\d+)\)-\((?P<l2>\d+),(?P<c2>\d+)\)$").unwrap()
});

/// `package-id:Module.Path`, the answer for identifiers defined in a
/// package the session did not load source for.
static PACKAGE_MODULE_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<package>[A-Za-z0-9][A-Za-z0-9._-]*):(?P<module>[A-Z][A-Za-z0-9_']*(?:\.[A-Z][A-Za-z0-9_']*)*)$").unwrap()
});

/// A bare dotted module path.
static MODULE_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9_']*(?:\.[A-Z][A-Za-z0-9_']*)*$").unwrap());

/// Substring of the session's "not exported here" answer.
const NO_MATCHING_EXPORT: &str = "No matching export";

/// Collaborators the parser resolves answers against.
pub struct AnswerContext<'a> {
    pub tree: &'a dyn SourceTree,
    pub modules: &'a dyn ModuleIndex,
    pub project: ProjectId,
    /// File the query originated from, for failure attribution.
    pub origin: FileId,
}

/// Interpret one location answer for the identifier `name`.
pub fn parse_location_answer(line: &str, name: &str, ctx: &AnswerContext<'_>) -> Resolution {
    let line = line.trim();

    if let Some(caps) = SPAN_ANSWER.captures(line) {
        if let (Some(l1), Some(c1)) = (cap_u32(&caps, "l1"), cap_u32(&caps, "c1")) {
            let start = LineCol::from_one_indexed(l1, c1);
            return resolve_span_answer(&caps["path"], start, name, ctx);
        }
    }

    if let Some(caps) = PACKAGE_MODULE_ANSWER.captures(line) {
        let package = strip_package_version(&caps["package"]);
        let module = ModuleName::new(&caps["module"]);
        return resolve_module_answer(Some(package), module, name, ctx);
    }

    if MODULE_ANSWER.is_match(line) {
        return resolve_module_answer(None, ModuleName::new(line), name, ctx);
    }

    if line.contains(NO_MATCHING_EXPORT) {
        return Err(ResolutionFailure::NoMatchingExport);
    }

    tracing::warn!(answer = line, "unrecognized location answer from session");
    Err(ResolutionFailure::no_info(name, ctx.origin))
}

fn cap_u32(caps: &Captures<'_>, group: &str) -> Option<u32> {
    caps.name(group)?.as_str().parse().ok()
}

/// Drop the version suffix from a package identifier:
/// `base-4.14.0.0` becomes `base`, `ghc-prim-0.6.1` becomes `ghc-prim`.
fn strip_package_version(package: &str) -> &str {
    let bytes = package.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'-' && bytes.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
            return &package[..i];
        }
    }
    package
}

fn resolve_span_answer(
    path: &str,
    start: LineCol,
    name: &str,
    ctx: &AnswerContext<'_>,
) -> Resolution {
    synchronized_read(ctx.tree, || {
        let Some(file) = ctx.tree.file_by_path(path)? else {
            tracing::debug!(path, "session answered with an unknown path");
            return Err(ResolutionFailure::no_info(name, ctx.origin));
        };
        match ctx.tree.named_element_at(file, start, name)? {
            Some(element) => Ok(DefinitionLocation::local(element)),
            None => Err(ResolutionFailure::no_info(name, ctx.origin)),
        }
    })
}

fn resolve_module_answer(
    package: Option<&str>,
    module: ModuleName,
    name: &str,
    ctx: &AnswerContext<'_>,
) -> Resolution {
    let files = ctx.modules.files_of_module(ctx.project, &module)?;
    if files.is_empty() {
        return Err(ResolutionFailure::ModuleUnavailable(module));
    }
    synchronized_read(ctx.tree, || {
        for file in &files {
            if let Some(element) = ctx.tree.find_named_element(*file, name)? {
                return Ok(DefinitionLocation::library(
                    module.clone(),
                    element,
                    package.map(SmolStr::new),
                ));
            }
        }
        Err(ResolutionFailure::no_info(name, ctx.origin))
    })
}
