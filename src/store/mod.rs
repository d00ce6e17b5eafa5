//! Entity store: sources, merging and canonical paths.

pub mod canonical;
mod memory;
pub mod source;

pub use canonical::CanonicalPaths;
pub use memory::EntityStore;
pub use source::{EntityRecord, EntitySource, RawValue, SourcePayload};
