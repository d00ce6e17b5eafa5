//! Index entries and their owners.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityKind};

/// Who a name belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "owner", rename_all = "snake_case")]
pub enum Owner {
    /// An entity from the store.
    Entity {
        /// Store id of the entity.
        id: EntityId,
        /// The entity's kind.
        kind: EntityKind,
        /// The entity's name.
        name: String,
    },
    /// A player from the roster.
    Player {
        /// The player's roster name.
        name: String,
    },
    /// A character on a player's roster.
    Character {
        /// Name of the owning player.
        player: String,
        /// The character's name.
        name: String,
    },
}

impl Owner {
    /// The kind used for type filtering.
    #[must_use]
    pub fn kind(&self) -> OwnerKind {
        match self {
            Self::Entity { kind, .. } => OwnerKind::Entity(*kind),
            Self::Player { .. } => OwnerKind::Player,
            Self::Character { .. } => OwnerKind::Character,
        }
    }

    /// The canonical name of the owner.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Entity { name, .. } | Self::Player { name } | Self::Character { name, .. } => name,
        }
    }

    /// The store id, for entity owners only.
    #[must_use]
    pub const fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::Entity { id, .. } => Some(*id),
            Self::Player { .. } | Self::Character { .. } => None,
        }
    }

    /// Returns true for players and their characters.
    #[must_use]
    pub const fn is_roster(&self) -> bool {
        matches!(self, Self::Player { .. } | Self::Character { .. })
    }

    /// Returns true if `filter` is absent or names this owner's kind.
    #[must_use]
    pub fn matches(&self, filter: Option<OwnerKind>) -> bool {
        filter.map_or(true, |kind| self.kind() == kind)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity { kind, name, .. } => write!(f, "{kind}/{name}"),
            Self::Player { name } => write!(f, "Gracz:{name}"),
            Self::Character { player, name } => write!(f, "Gracz:{player}/{name}"),
        }
    }
}

/// Kind of an owner; doubles as the resolver's type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// An entity of the given kind.
    Entity(EntityKind),
    /// A roster player.
    Player,
    /// A roster character.
    Character,
}

impl From<EntityKind> for OwnerKind {
    fn from(kind: EntityKind) -> Self {
        Self::Entity(kind)
    }
}

/// How a key was derived from its owner's names.
///
/// Ordering follows precedence: `Name` outranks `Word`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// A full name, alias or generic name.
    Name = 1,
    /// A single word taken from a multi-word name.
    Word = 2,
}

/// Named tie-break: at equal priority a roster owner displaces an entity of
/// a player-linked kind, which usually mirrors that same roster entry.
#[must_use]
pub fn roster_outranks_entity(roster: &Owner, entity: &Owner) -> bool {
    roster.is_roster()
        && matches!(entity, Owner::Entity { kind, .. } if kind.is_player_linked())
}

/// What an index key points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexEntry {
    /// Exactly one owner.
    Unique(Owner),
    /// Every owner that claimed the key at the same priority.
    Ambiguous(Vec<Owner>),
}

impl IndexEntry {
    /// The owner, if the key is unambiguous.
    #[must_use]
    pub const fn unique(&self) -> Option<&Owner> {
        match self {
            Self::Unique(owner) => Some(owner),
            Self::Ambiguous(_) => None,
        }
    }

    /// Returns true if more than one owner claimed the key.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// Every owner recorded for the key.
    #[must_use]
    pub fn owners(&self) -> &[Owner] {
        match self {
            Self::Unique(owner) => std::slice::from_ref(owner),
            Self::Ambiguous(owners) => owners,
        }
    }

    /// Adds a contender at the same priority.
    pub fn admit(&mut self, owner: Owner) {
        match self {
            Self::Unique(existing) => {
                if *existing == owner || roster_outranks_entity(existing, &owner) {
                    return;
                }
                if roster_outranks_entity(&owner, existing) {
                    *existing = owner;
                    return;
                }
                let first = existing.clone();
                *self = Self::Ambiguous(vec![first, owner]);
            }
            Self::Ambiguous(owners) => {
                if !owners.contains(&owner) {
                    owners.push(owner);
                }
            }
        }
    }
}

/// One key of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSlot {
    /// The key as first written, casing and diacritics intact.
    pub key: String,
    /// Precedence of the key for its owners.
    pub priority: Priority,
    /// The owner or owners of the key.
    pub entry: IndexEntry,
}
