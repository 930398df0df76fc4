//! Definition resolution.
//!
//! The result model ([`DefinitionLocation`], [`ResolutionFailure`]), the
//! session output parser, the strategy resolver, and the per-project
//! [`ResolutionCache`] in front of it all.

mod cache;
mod location;
pub mod output;
pub mod strategy;

#[cfg(test)]
pub(crate) mod fixture;

pub use cache::{ResolutionCache, StatsSnapshot};
pub use location::{
    DefinitionLocation, LibraryLocation, LocalLocation, Resolution, ResolutionFailure,
};
pub use output::{AnswerContext, parse_location_answer};
pub use strategy::{DefinitionResolver, ResolveOptions, Strategy};
