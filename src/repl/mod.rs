//! The interactive compiler session boundary.
//!
//! Process lifecycle (spawning, restarting, load state) belongs to the
//! embedder. This module defines what the resolution core needs from a
//! running session: an identity that survives handle cloning but never a
//! restart ([`ReplSession`]), a per-project registry of current sessions
//! ([`SessionRegistry`]), and the query contract ([`ReplClient`]).

mod client;
mod session;

pub use client::{ReplClient, ReplOutput};
pub use session::{ReplSession, SessionRegistry};
