//! Case-insensitive token index with a parallel stem index.

use std::collections::HashMap;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::declension::DeclensionRules;
use crate::entity::Entity;
use crate::index::entry::{IndexEntry, IndexSlot, Owner, Priority};
use crate::player::Player;
use crate::store::EntityStore;

/// Lookup key for a name: case folded, diacritics kept.
#[must_use]
pub fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Every name of the identity space mapped to its owner.
///
/// Slots keep insertion order, so iteration and the stem index are
/// deterministic for a given snapshot.
#[derive(Debug, Clone, Default)]
pub struct TokenIndex {
    slots: Vec<IndexSlot>,
    by_key: HashMap<String, usize>,
    stems: HashMap<String, Vec<usize>>,
    min_token_len: usize,
}

impl TokenIndex {
    /// Creates an empty index that drops words shorter than `min_token_len`.
    #[must_use]
    pub fn new(min_token_len: usize) -> Self {
        Self {
            min_token_len,
            ..Self::default()
        }
    }

    /// Indexes a whole snapshot: the roster first, then every entity.
    #[must_use]
    pub fn build(
        store: &EntityStore,
        players: &[Player],
        rules: &DeclensionRules,
        config: &ResolverConfig,
    ) -> Self {
        let mut index = Self::new(config.min_token_len);
        for player in players {
            index.add_player(player);
        }
        for entity in store.iter() {
            index.add_entity(entity);
        }
        index.rebuild_stems(rules);
        debug!(
            keys = index.len(),
            stems = index.stems.len(),
            ambiguous = index.slots.iter().filter(|s| s.entry.is_ambiguous()).count(),
            "token index built"
        );
        index
    }

    /// Indexes a player's name and every character name and alias.
    pub fn add_player(&mut self, player: &Player) {
        self.add_name(
            &player.name,
            &Owner::Player {
                name: player.name.clone(),
            },
        );
        for character in &player.characters {
            let owner = Owner::Character {
                player: player.name.clone(),
                name: character.name.clone(),
            };
            self.add_name(&character.name, &owner);
            for alias in &character.aliases {
                self.add_name(alias, &owner);
            }
        }
    }

    /// Indexes an entity's name, every alias ever held and its generic names.
    pub fn add_entity(&mut self, entity: &Entity) {
        let owner = Owner::Entity {
            id: entity.id,
            kind: entity.kind,
            name: entity.name.clone(),
        };
        self.add_name(&entity.name, &owner);
        for alias in entity.aliases() {
            self.add_name(alias, &owner);
        }
        for generic in &entity.generic_names {
            self.add_name(generic, &owner);
        }
    }

    /// Indexes a full name, plus each of its words when it has several.
    pub fn add_name(&mut self, name: &str, owner: &Owner) {
        let name = name.trim();
        self.insert(name, owner.clone(), Priority::Name);

        let words: Vec<&str> = name.split_whitespace().collect();
        if words.len() < 2 {
            return;
        }
        for word in words {
            if word.chars().count() >= self.min_token_len {
                self.insert(word, owner.clone(), Priority::Word);
            }
        }
    }

    /// Inserts one key, applying the priority and ambiguity rules.
    ///
    /// A stronger priority replaces the slot, a weaker one is ignored and an
    /// equal one is admitted as a contender.
    pub fn insert(&mut self, key: &str, owner: Owner, priority: Priority) {
        let normalized = normalize_key(key);
        if normalized.is_empty() {
            return;
        }
        match self.by_key.get(&normalized) {
            None => {
                self.by_key.insert(normalized, self.slots.len());
                self.slots.push(IndexSlot {
                    key: key.trim().to_string(),
                    priority,
                    entry: IndexEntry::Unique(owner),
                });
            }
            Some(&idx) => {
                let slot = &mut self.slots[idx];
                match priority.cmp(&slot.priority) {
                    std::cmp::Ordering::Less => {
                        slot.key = key.trim().to_string();
                        slot.priority = priority;
                        slot.entry = IndexEntry::Unique(owner);
                    }
                    std::cmp::Ordering::Equal => slot.entry.admit(owner),
                    std::cmp::Ordering::Greater => {}
                }
            }
        }
    }

    /// Recomputes the stem index from the current keys.
    pub fn rebuild_stems(&mut self, rules: &DeclensionRules) {
        self.stems.clear();
        for (idx, slot) in self.slots.iter().enumerate() {
            let stem = normalize_key(&rules.stem(&slot.key));
            if !stem.is_empty() {
                self.stems.entry(stem).or_default().push(idx);
            }
        }
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&IndexSlot> {
        self.by_key
            .get(&normalize_key(key))
            .map(|&idx| &self.slots[idx])
    }

    /// Keys whose stem equals `stem`, in insertion order.
    pub fn stem_candidates(&self, stem: &str) -> impl Iterator<Item = &IndexSlot> {
        self.stems
            .get(&normalize_key(stem))
            .into_iter()
            .flatten()
            .map(|&idx| &self.slots[idx])
    }

    /// Iterates over every slot in insertion order.
    pub fn slots(&self) -> impl Iterator<Item = &IndexSlot> {
        self.slots.iter()
    }

    /// Stored keys with their original casing.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.key.as_str())
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no key is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
