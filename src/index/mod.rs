//! The token index: every name in the identity space mapped to its owner.

mod entry;
mod tokens;

pub use entry::{roster_outranks_entity, IndexEntry, IndexSlot, Owner, OwnerKind, Priority};
pub use tokens::{normalize_key, TokenIndex};
