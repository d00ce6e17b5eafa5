//! The identity space of one snapshot: index, search tree and resolution rules.
//!
//! The index is never updated in place. When the snapshot changes, build a new
//! space; [`IdentitySpace::is_stale`] tells whether that is needed.

use blake3::{Hash, Hasher};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::declension::DeclensionRules;
use crate::index::{normalize_key, TokenIndex};
use crate::player::Player;
use crate::resolver::Resolver;
use crate::search::BkTree;
use crate::store::EntityStore;

/// Digest of every name that feeds the token index.
#[must_use]
pub fn fingerprint(store: &EntityStore, players: &[Player]) -> Hash {
    let mut h = Hasher::new();
    let mut field = |s: &str| {
        h.update(s.as_bytes());
        h.update(&[0]);
    };
    for player in players {
        field("player");
        field(&player.name);
        for character in &player.characters {
            field("character");
            field(&character.name);
            for alias in &character.aliases {
                field(alias);
            }
        }
    }
    for entity in store.iter() {
        field("entity");
        field(entity.kind.label());
        field(&entity.name);
        for alias in entity.aliases() {
            field(alias);
        }
        for generic in &entity.generic_names {
            field(generic);
        }
    }
    h.finalize()
}

/// Everything a [`Resolver`] borrows, built once per snapshot.
///
/// # Examples
///
/// ```
/// use kronika::{Entity, EntityKind, EntityStore, IdentitySpace, ResolverConfig};
///
/// let store = EntityStore::from_entities([Entity::new("Xeron Demonlord", EntityKind::Person)]);
/// let space = IdentitySpace::build(&store, &[], ResolverConfig::default());
/// let owner = space.resolver().resolve("Xeron Demonlors", None).unwrap();
/// assert_eq!(owner.name(), "Xeron Demonlord");
/// ```
#[derive(Debug, Clone)]
pub struct IdentitySpace {
    index: TokenIndex,
    tree: Option<BkTree>,
    rules: DeclensionRules,
    config: ResolverConfig,
    fingerprint: Hash,
}

impl IdentitySpace {
    /// Builds a space with the Polish declension tables.
    #[must_use]
    pub fn build(store: &EntityStore, players: &[Player], config: ResolverConfig) -> Self {
        let rules = DeclensionRules::polish().with_min_stem_len(config.min_stem_len);
        Self::with_rules(store, players, rules, config)
    }

    /// Builds a space with custom declension tables.
    #[must_use]
    pub fn with_rules(
        store: &EntityStore,
        players: &[Player],
        rules: DeclensionRules,
        config: ResolverConfig,
    ) -> Self {
        let index = TokenIndex::build(store, players, &rules, &config);
        let tree = config
            .use_search_tree
            .then(|| index.keys().map(normalize_key).collect::<BkTree>());
        let fingerprint = fingerprint(store, players);
        debug!(
            keys = index.len(),
            tree = tree.is_some(),
            fingerprint = %fingerprint.to_hex(),
            "identity space built"
        );
        Self {
            index,
            tree,
            rules,
            config,
            fingerprint,
        }
    }

    /// A resolver borrowing this space.
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.index, self.tree.as_ref(), &self.rules, &self.config)
    }

    /// Returns true if the snapshot's names differ from those indexed.
    #[must_use]
    pub fn is_stale(&self, store: &EntityStore, players: &[Player]) -> bool {
        fingerprint(store, players) != self.fingerprint
    }

    /// Digest of the names this space was built from.
    #[must_use]
    pub const fn fingerprint(&self) -> &Hash {
        &self.fingerprint
    }

    /// The token index.
    #[must_use]
    pub const fn index(&self) -> &TokenIndex {
        &self.index
    }

    /// The search tree, if enabled in the config.
    #[must_use]
    pub const fn tree(&self) -> Option<&BkTree> {
        self.tree.as_ref()
    }

    /// The declension rules.
    #[must_use]
    pub const fn rules(&self) -> &DeclensionRules {
        &self.rules
    }

    /// The resolver config.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }
}
