//! Query contract with the interactive session.

use smol_str::SmolStr;

use crate::base::{FileId, LineCol};
use crate::repl::ReplSession;

/// One answer from the session, split by stream.
///
/// Lines arrive stripped of the protocol prompt and trailing newlines.
/// Some session versions print valid answers on stderr; the resolver
/// decides whether to accept those, not the client.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplOutput {
    pub stdout: Vec<SmolStr>,
    pub stderr: Vec<SmolStr>,
}

impl ReplOutput {
    pub fn from_stdout<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            stdout: lines.into_iter().map(Into::into).collect(),
            stderr: Vec::new(),
        }
    }
}

/// Blocking query access to a project's interactive session.
///
/// Implementations own the process, the protocol framing, and all
/// timeout handling. Positions are 0-indexed [`LineCol`]; the client
/// converts to the wire's 1-indexed form when serializing the query.
pub trait ReplClient: Send + Sync {
    /// Whether `session` is alive and has the project loaded well enough
    /// to answer location queries.
    fn available(&self, session: &ReplSession) -> bool;

    /// Ask where the identifier spanning `start..end` in `file` is
    /// defined. `None` means the session produced no answer at all
    /// (died, busy reloading, or timed out); an empty [`ReplOutput`] is
    /// an answer and is interpreted by the resolver.
    fn find_definition(
        &self,
        session: &ReplSession,
        file: FileId,
        start: LineCol,
        end: LineCol,
        name: &str,
    ) -> Option<ReplOutput>;
}
