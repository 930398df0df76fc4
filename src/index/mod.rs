//! Consumed lookup services.
//!
//! Module indexing and name-info lookup are maintained elsewhere in the
//! editor; the resolver consumes them through these traits. Both answer
//! from indices, independent of the interactive session, which is what
//! makes them usable for library code the session never loaded.

mod module_index;
mod name_info;

pub use module_index::{ModuleIdentifier, ModuleIndex};
pub use name_info::{NameInfo, NameInfoService};
