//! # Kronika - identity resolution and temporal state for campaign chronicles
//!
//! Kronika keeps the entities of a tabletop campaign (characters,
//! organizations, places, items and the players' own characters) together
//! with the dated history of each of their attributes, and resolves the
//! free-text, often declined, Polish names found in session notes back to
//! those entities.
//!
//! ## Core Concepts
//!
//! - **Entity**: a named record addressed by `(kind, name)`, carrying temporal
//!   histories of aliases, location, group, owner, status, doors, type and quantity
//! - **TemporalValue**: a value with an inclusive validity range; partial dates allowed
//! - **Token index**: every name and alias mapped to its owner, with ambiguity made explicit
//! - **Resolver**: exact, declension, alternation and edit-distance stages over the index
//! - **State merge**: dated change directives folded into the histories
//!
//! ## Usage
//!
//! ```rust
//! use kronika::{Entity, EntityKind, EntityStore, IdentitySpace, ResolverConfig};
//!
//! let store = EntityStore::from_entities([
//!     Entity::new("Xeron Demonlord", EntityKind::Person),
//!     Entity::new("Bracada", EntityKind::Place),
//! ]);
//! let space = IdentitySpace::build(&store, &[], ResolverConfig::default());
//! let resolver = space.resolver();
//!
//! assert_eq!(resolver.resolve("Xeronowi Demonlordowi", None).unwrap().name(), "Xeron Demonlord");
//! assert_eq!(resolver.resolve("Bracadzie", None).unwrap().name(), "Bracada");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod declension;
pub mod entity;
pub mod error;
pub mod player;
pub mod time;

// Store, index and resolution
pub mod index;
pub mod merge;
pub mod resolver;
pub mod search;
pub mod space;
pub mod store;

pub use config::ResolverConfig;
pub use declension::DeclensionRules;
pub use entity::{Entity, EntityId, EntityKind, HistoryKind};
pub use error::{KronikaError, KronikaResult, SourceError, ValidationError};
pub use index::{IndexEntry, Owner, OwnerKind, TokenIndex};
pub use merge::{merge_state, ChangeDirective, MergeOptions, MergeOutcome, MergeReport, TagChange};
pub use player::{Player, PlayerCharacter};
pub use resolver::{MatchStage, Query, Resolution, ResolutionCache, Resolver};
pub use search::BkTree;
pub use space::IdentitySpace;
pub use store::{EntityRecord, EntitySource, EntityStore};
pub use time::{all_active, is_active, last_active, TemporalValue};
