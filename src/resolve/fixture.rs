//! Shared in-memory fakes for resolver and cache tests.
//!
//! `FakeTree` harvests top-level declarations from Haskell-ish snippet
//! text, so tests read like small source files instead of coordinate
//! tables. All fakes take interior mutability so tests can edit, kill,
//! and poison state mid-scenario.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{
    FileId, FileRevision, LineCol, LineIndex, ModuleName, ProjectId, TextRange, TextSize,
};
use crate::index::{ModuleIdentifier, ModuleIndex, NameInfo, NameInfoService};
use crate::repl::{ReplClient, ReplOutput, ReplSession, SessionRegistry};
use crate::resolve::strategy::{DefinitionResolver, ResolveOptions};
use crate::resolve::ResolutionFailure;
use crate::tree::{ElementPtr, FileRole, ProbeError, ReferenceKey, SourceTree};

pub(crate) const PROJECT: ProjectId = ProjectId::new(1);

#[derive(Clone)]
pub(crate) struct FakeElement {
    pub name: SmolStr,
    /// Current display name; diverges from `name` after a rename.
    pub display: SmolStr,
    pub range: TextRange,
    pub alive: bool,
}

#[derive(Clone)]
pub(crate) struct FakeFile {
    pub path: String,
    pub revision: FileRevision,
    pub role: FileRole,
    pub index: LineIndex,
    pub elements: Vec<FakeElement>,
    pub imports: Vec<ModuleName>,
    pub qualifiers: FxHashMap<SmolStr, Vec<ModuleName>>,
}

/// Tokens that start a top-level line without being a declaration name.
const NON_DECLARATIONS: &[&str] = &[
    "module", "import", "where", "--", "{-", "data", "type", "newtype", "class", "instance",
];

fn harvest_elements(text: &str) -> Vec<FakeElement> {
    let mut elements = Vec::new();
    let mut offset = 0u32;
    for line in text.lines() {
        if !line.is_empty() && !line.starts_with([' ', '\t']) {
            if let Some(token) = line.split_whitespace().next() {
                if !NON_DECLARATIONS.contains(&token) {
                    let range = TextRange::new(
                        TextSize::from(offset),
                        TextSize::from(offset + token.len() as u32),
                    );
                    elements.push(FakeElement {
                        name: SmolStr::new(token),
                        display: SmolStr::new(token),
                        range,
                        alive: true,
                    });
                }
            }
        }
        offset += line.len() as u32 + 1;
    }
    elements
}

#[derive(Default)]
pub(crate) struct FakeTree {
    files: Mutex<FxHashMap<FileId, FakeFile>>,
    pub sync_reads: AtomicUsize,
    poisoned: AtomicBool,
}

impl FakeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, file: FileId, path: &str, role: FileRole, text: &str) {
        self.files.lock().insert(
            file,
            FakeFile {
                path: path.to_owned(),
                revision: FileRevision::new(0),
                role,
                index: LineIndex::new(text),
                elements: harvest_elements(text),
                imports: Vec::new(),
                qualifiers: FxHashMap::default(),
            },
        );
    }

    /// Add a declaration the harvester does not pick up, e.g. a
    /// constructor inside a `data` line.
    pub fn push_element(&self, file: FileId, name: &str, start: u32) {
        if let Some(f) = self.files.lock().get_mut(&file) {
            let range = TextRange::new(
                TextSize::from(start),
                TextSize::from(start + name.len() as u32),
            );
            f.elements.push(FakeElement {
                name: SmolStr::new(name),
                display: SmolStr::new(name),
                range,
                alive: true,
            });
        }
    }

    pub fn set_imports(&self, file: FileId, modules: &[&str]) {
        if let Some(f) = self.files.lock().get_mut(&file) {
            f.imports = modules.iter().map(|m| ModuleName::new(*m)).collect();
        }
    }

    pub fn bind_qualifier(&self, file: FileId, qualifier: &str, modules: &[&str]) {
        if let Some(f) = self.files.lock().get_mut(&file) {
            f.qualifiers.insert(
                SmolStr::new(qualifier),
                modules.iter().map(|m| ModuleName::new(*m)).collect(),
            );
        }
    }

    pub fn bump_revision(&self, file: FileId) {
        if let Some(f) = self.files.lock().get_mut(&file) {
            f.revision = f.revision.next();
        }
    }

    pub fn remove_file(&self, file: FileId) {
        self.files.lock().remove(&file);
    }

    pub fn kill_element(&self, file: FileId, name: &str) {
        if let Some(f) = self.files.lock().get_mut(&file) {
            for e in f.elements.iter_mut().filter(|e| e.display == name) {
                e.alive = false;
            }
        }
    }

    pub fn rename_element(&self, file: FileId, name: &str, to: &str) {
        if let Some(f) = self.files.lock().get_mut(&file) {
            for e in f.elements.iter_mut().filter(|e| e.display == name) {
                e.display = SmolStr::new(to);
            }
        }
    }

    /// Make every probe fail until cured.
    pub fn poison(&self) {
        self.poisoned.store(true, Ordering::SeqCst);
    }

    pub fn cure(&self) {
        self.poisoned.store(false, Ordering::SeqCst);
    }

    pub fn revision(&self, file: FileId) -> FileRevision {
        self.files
            .lock()
            .get(&file)
            .map(|f| f.revision)
            .unwrap_or_default()
    }

    fn guard(&self) -> Result<(), ProbeError> {
        if self.poisoned.load(Ordering::SeqCst) {
            Err(ProbeError::ConcurrentMutation)
        } else {
            Ok(())
        }
    }

    fn ptr(&self, file: FileId, revision: FileRevision, element: &FakeElement) -> ElementPtr {
        ElementPtr {
            file,
            revision,
            range: element.range,
            name: element.display.clone(),
        }
    }
}

impl SourceTree for FakeTree {
    fn run_synchronized_read(&self, action: &mut dyn FnMut()) {
        self.sync_reads.fetch_add(1, Ordering::SeqCst);
        action();
    }

    fn file_revision(&self, file: FileId) -> Result<Option<FileRevision>, ProbeError> {
        self.guard()?;
        Ok(self.files.lock().get(&file).map(|f| f.revision))
    }

    fn file_role(&self, file: FileId) -> Result<FileRole, ProbeError> {
        self.guard()?;
        Ok(self
            .files
            .lock()
            .get(&file)
            .map(|f| f.role)
            .unwrap_or_default())
    }

    fn file_by_path(&self, path: &str) -> Result<Option<FileId>, ProbeError> {
        self.guard()?;
        Ok(self
            .files
            .lock()
            .iter()
            .find(|(_, f)| f.path == path)
            .map(|(id, _)| *id))
    }

    fn line_col(&self, file: FileId, offset: TextSize) -> Result<Option<LineCol>, ProbeError> {
        self.guard()?;
        Ok(self
            .files
            .lock()
            .get(&file)
            .and_then(|f| f.index.line_col(offset)))
    }

    fn named_element_at(
        &self,
        file: FileId,
        at: LineCol,
        name: &str,
    ) -> Result<Option<ElementPtr>, ProbeError> {
        self.guard()?;
        let files = self.files.lock();
        let Some(f) = files.get(&file) else {
            return Ok(None);
        };
        let Some(offset) = f.index.offset(at) else {
            return Ok(None);
        };
        Ok(f.elements
            .iter()
            .find(|e| e.alive && e.range.start() == offset && e.display == name)
            .map(|e| self.ptr(file, f.revision, e)))
    }

    fn find_named_element(
        &self,
        file: FileId,
        name: &str,
    ) -> Result<Option<ElementPtr>, ProbeError> {
        self.guard()?;
        let files = self.files.lock();
        let Some(f) = files.get(&file) else {
            return Ok(None);
        };
        Ok(f.elements
            .iter()
            .find(|e| e.alive && e.display == name)
            .map(|e| self.ptr(file, f.revision, e)))
    }

    fn element_display_name(&self, element: &ElementPtr) -> Result<Option<SmolStr>, ProbeError> {
        self.guard()?;
        let files = self.files.lock();
        let Some(f) = files.get(&element.file) else {
            return Ok(None);
        };
        Ok(f.elements
            .iter()
            .find(|e| e.alive && e.range == element.range)
            .map(|e| e.display.clone()))
    }

    fn top_level_identifiers(&self, file: FileId) -> Result<Vec<SmolStr>, ProbeError> {
        self.guard()?;
        let files = self.files.lock();
        let Some(f) = files.get(&file) else {
            return Ok(Vec::new());
        };
        Ok(f.elements
            .iter()
            .filter(|e| e.alive)
            .map(|e| e.display.clone())
            .collect())
    }

    fn imported_modules(&self, file: FileId) -> Result<Vec<ModuleName>, ProbeError> {
        self.guard()?;
        Ok(self
            .files
            .lock()
            .get(&file)
            .map(|f| f.imports.clone())
            .unwrap_or_default())
    }

    fn qualifier_binding(
        &self,
        file: FileId,
        qualifier: &str,
    ) -> Result<Vec<ModuleName>, ProbeError> {
        self.guard()?;
        Ok(self
            .files
            .lock()
            .get(&file)
            .and_then(|f| f.qualifiers.get(qualifier).cloned())
            .unwrap_or_default())
    }
}

/// Reusable open/wait latch for cross-thread scheduling in tests.
pub(crate) struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            open: Mutex::new(false),
            cv: Condvar::new(),
        })
    }

    pub fn open(&self) {
        *self.open.lock() = true;
        self.cv.notify_all();
    }

    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.cv.wait(&mut open);
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeRepl {
    replies: Mutex<VecDeque<Option<ReplOutput>>>,
    pub calls: AtomicUsize,
    gate: Mutex<Option<Arc<Gate>>>,
    down: AtomicBool,
}

impl FakeRepl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_stdout(&self, line: &str) {
        self.replies
            .lock()
            .push_back(Some(ReplOutput::from_stdout([line])));
    }

    pub fn reply_stderr(&self, line: &str) {
        self.replies.lock().push_back(Some(ReplOutput {
            stdout: Vec::new(),
            stderr: vec![SmolStr::new(line)],
        }));
    }

    pub fn reply_silence(&self) {
        self.replies.lock().push_back(Some(ReplOutput::default()));
    }

    pub fn reply_nothing(&self) {
        self.replies.lock().push_back(None);
    }

    pub fn take_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    /// Block `find_definition` on `gate` until it is opened.
    pub fn hold_at(&self, gate: Arc<Gate>) {
        *self.gate.lock() = Some(gate);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReplClient for FakeRepl {
    fn available(&self, _session: &ReplSession) -> bool {
        !self.down.load(Ordering::SeqCst)
    }

    fn find_definition(
        &self,
        _session: &ReplSession,
        _file: FileId,
        _start: LineCol,
        _end: LineCol,
        _name: &str,
    ) -> Option<ReplOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait();
        }
        self.replies.lock().pop_front().unwrap_or(None)
    }
}

#[derive(Default)]
pub(crate) struct FakeModules {
    files: Mutex<FxHashMap<ModuleName, Vec<FileId>>>,
    library_ids: Mutex<FxHashMap<ModuleName, Vec<ModuleIdentifier>>>,
    not_ready: AtomicBool,
}

impl FakeModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_module(&self, module: &str, files: &[FileId]) {
        self.files
            .lock()
            .insert(ModuleName::new(module), files.to_vec());
    }

    pub fn set_library_identifiers(&self, module: &str, names: &[&str]) {
        let module = ModuleName::new(module);
        let ids = names
            .iter()
            .map(|n| ModuleIdentifier::new(module.clone(), *n))
            .collect();
        self.library_ids.lock().insert(module, ids);
    }

    pub fn set_not_ready(&self, value: bool) {
        self.not_ready.store(value, Ordering::SeqCst);
    }
}

impl ModuleIndex for FakeModules {
    fn files_of_module(
        &self,
        _project: ProjectId,
        module: &ModuleName,
    ) -> Result<Vec<FileId>, ResolutionFailure> {
        if self.not_ready.load(Ordering::SeqCst) {
            return Err(ResolutionFailure::IndexNotReady);
        }
        Ok(self.files.lock().get(module).cloned().unwrap_or_default())
    }

    fn library_module_identifiers(
        &self,
        _project: ProjectId,
        module: &ModuleName,
    ) -> Option<Vec<ModuleIdentifier>> {
        self.library_ids.lock().get(module).cloned()
    }
}

#[derive(Default)]
pub(crate) struct FakeNames {
    answers: Mutex<FxHashMap<SmolStr, Vec<NameInfo>>>,
    failure: Mutex<Option<ResolutionFailure>>,
}

impl FakeNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, name: &str, infos: Vec<NameInfo>) {
        self.answers.lock().insert(SmolStr::new(name), infos);
    }

    pub fn fail_with(&self, failure: ResolutionFailure) {
        *self.failure.lock() = Some(failure);
    }
}

impl NameInfoService for FakeNames {
    fn name_info(&self, key: &ReferenceKey) -> Result<Vec<NameInfo>, ResolutionFailure> {
        if let Some(failure) = self.failure.lock().clone() {
            return Err(failure);
        }
        Ok(self
            .answers
            .lock()
            .get(key.base_name())
            .cloned()
            .unwrap_or_default())
    }
}

/// A resolver plus all its fakes, wired and with a live session.
pub(crate) struct Rig {
    pub tree: Arc<FakeTree>,
    pub repl: Arc<FakeRepl>,
    pub names: Arc<FakeNames>,
    pub modules: Arc<FakeModules>,
    pub sessions: Arc<SessionRegistry>,
    pub resolver: Arc<DefinitionResolver>,
}

pub(crate) fn rig() -> Rig {
    rig_with(ResolveOptions::default())
}

pub(crate) fn rig_with(options: ResolveOptions) -> Rig {
    let tree = Arc::new(FakeTree::new());
    let repl = Arc::new(FakeRepl::new());
    let names = Arc::new(FakeNames::new());
    let modules = Arc::new(FakeModules::new());
    let sessions = Arc::new(SessionRegistry::new());
    sessions.set(ReplSession::new(PROJECT));

    let resolver = Arc::new(DefinitionResolver::new(
        tree.clone(),
        repl.clone(),
        names.clone(),
        modules.clone(),
        sessions.clone(),
        options,
    ));

    Rig {
        tree,
        repl,
        names,
        modules,
        sessions,
        resolver,
    }
}

/// A key for `name` in `file`, ranged at the file's declaration of that
/// name when one exists.
pub(crate) fn key_for(tree: &FakeTree, file: FileId, name: &str) -> ReferenceKey {
    key_with_qualifier(tree, file, name, None)
}

pub(crate) fn key_with_qualifier(
    tree: &FakeTree,
    file: FileId,
    name: &str,
    qualifier: Option<&str>,
) -> ReferenceKey {
    let base = crate::base::split_qualified(name).map_or(name, |(_, b)| b);
    let range = tree
        .find_named_element(file, base)
        .ok()
        .flatten()
        .map(|e| e.range)
        .unwrap_or_else(|| TextRange::empty(TextSize::from(0)));
    ReferenceKey {
        file,
        revision: tree.revision(file),
        range,
        name: SmolStr::new(name),
        qualifier: qualifier.map(SmolStr::new),
    }
}
