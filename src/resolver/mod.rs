//! Four-stage name resolution.
//!
//! A query is tried against the token index in order of decreasing
//! confidence; each stage runs only if the previous one produced no usable
//! owner (unique, and of the requested kind when a filter is given):
//!
//! 1. exact, case-insensitive lookup;
//! 2. declension stripping, through the stem index;
//! 3. stem alternation, looking each base form up directly;
//! 4. approximate match within an edit-distance budget.
//!
//! An ambiguous key is never an error. It simply does not satisfy its stage.

mod cache;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ResolverConfig;
use crate::declension::DeclensionRules;
use crate::index::{normalize_key, IndexSlot, Owner, OwnerKind, TokenIndex};
use crate::search::{edit_distance, BkTree};

pub use cache::{Cached, ResolutionCache};

/// A name to resolve, with its type filter and optional edit budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Free text as written in the notes.
    pub text: String,
    /// Only owners of this kind are accepted.
    pub filter: Option<OwnerKind>,
    /// Overrides the length-derived edit budget of the approximate stage.
    pub max_distance: Option<usize>,
}

impl Query {
    /// An unfiltered query with the default edit budget.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filter: None,
            max_distance: None,
        }
    }

    /// Restricts the query to one owner kind.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<OwnerKind>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets an explicit edit budget.
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = Some(max_distance);
        self
    }
}

/// Stage that produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// Case-insensitive key match.
    Exact,
    /// Match on the stem left after stripping case endings.
    Declension,
    /// Match after undoing a stem alternation.
    Alternation,
    /// Nearest key within the edit budget.
    Approximate,
}

/// A resolved owner and how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The owner the name resolved to.
    pub owner: Owner,
    /// The stage that matched.
    pub stage: MatchStage,
    /// The index key that matched, in its stored casing.
    pub key: String,
    /// Edit distance between query and key; zero outside the approximate stage.
    pub distance: usize,
}

/// Resolves free-text names against a token index.
///
/// Borrowed pieces are usually supplied by an
/// [`IdentitySpace`](crate::IdentitySpace).
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a TokenIndex,
    tree: Option<&'a BkTree>,
    rules: &'a DeclensionRules,
    config: &'a ResolverConfig,
}

fn usable(slot: &IndexSlot, filter: Option<OwnerKind>) -> Option<&Owner> {
    slot.entry.unique().filter(|owner| owner.matches(filter))
}

impl<'a> Resolver<'a> {
    /// Creates a resolver; without a tree the approximate stage scans the index.
    #[must_use]
    pub const fn new(
        index: &'a TokenIndex,
        tree: Option<&'a BkTree>,
        rules: &'a DeclensionRules,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            index,
            tree,
            rules,
            config,
        }
    }

    /// Resolves `query` to its owner, or `None` if nothing usable matches.
    #[must_use]
    pub fn resolve(&self, query: &str, filter: Option<OwnerKind>) -> Option<Owner> {
        let query = Query {
            text: query.to_string(),
            filter,
            max_distance: None,
        };
        self.lookup(&query, None).map(|resolution| resolution.owner)
    }

    /// Resolves `query`, consulting and filling `cache` when one is given.
    pub fn lookup(&self, query: &Query, cache: Option<&mut ResolutionCache>) -> Option<Resolution> {
        match cache {
            Some(cache) => {
                if let Some(cached) = cache.get(query) {
                    return cached.clone().into_resolution();
                }
                let result = self.run_stages(query);
                cache.insert(query, Cached::from(result.clone()));
                result
            }
            None => self.run_stages(query),
        }
    }

    fn run_stages(&self, query: &Query) -> Option<Resolution> {
        let text = query.text.trim();
        if text.is_empty() {
            return None;
        }
        let result = self
            .exact(text, query.filter)
            .or_else(|| self.declension(text, query.filter))
            .or_else(|| self.alternation(text, query.filter))
            .or_else(|| self.approximate(text, query.filter, query.max_distance));
        match &result {
            Some(r) => debug!(query = text, stage = ?r.stage, key = %r.key, distance = r.distance, "name resolved"),
            None => debug!(query = text, "name unresolved"),
        }
        result
    }

    fn resolution(slot: &IndexSlot, owner: &Owner, stage: MatchStage, distance: usize) -> Resolution {
        Resolution {
            owner: owner.clone(),
            stage,
            key: slot.key.clone(),
            distance,
        }
    }

    fn exact(&self, text: &str, filter: Option<OwnerKind>) -> Option<Resolution> {
        let slot = self.index.get(text)?;
        usable(slot, filter).map(|owner| Self::resolution(slot, owner, MatchStage::Exact, 0))
    }

    fn declension(&self, text: &str, filter: Option<OwnerKind>) -> Option<Resolution> {
        let stem = self.rules.stem(text);
        self.index.stem_candidates(&stem).find_map(|slot| {
            usable(slot, filter).map(|owner| Self::resolution(slot, owner, MatchStage::Declension, 0))
        })
    }

    fn alternation(&self, text: &str, filter: Option<OwnerKind>) -> Option<Resolution> {
        self.rules.alternations(text).iter().find_map(|candidate| {
            let slot = self.index.get(candidate)?;
            usable(slot, filter).map(|owner| Self::resolution(slot, owner, MatchStage::Alternation, 0))
        })
    }

    fn approximate(
        &self,
        text: &str,
        filter: Option<OwnerKind>,
        max_distance: Option<usize>,
    ) -> Option<Resolution> {
        let needle = normalize_key(text);
        let threshold =
            max_distance.unwrap_or_else(|| self.config.max_distance_for(needle.chars().count()));

        match self.tree {
            Some(tree) => {
                let mut hits = tree.search(&needle, threshold);
                hits.sort_by_key(|hit| hit.distance);
                hits.into_iter().find_map(|hit| {
                    let slot = self.index.get(hit.key)?;
                    usable(slot, filter).map(|owner| {
                        Self::resolution(slot, owner, MatchStage::Approximate, hit.distance)
                    })
                })
            }
            None => self.scan(&needle, filter, threshold),
        }
    }

    fn scan(&self, needle: &str, filter: Option<OwnerKind>, threshold: usize) -> Option<Resolution> {
        let needle_len = needle.chars().count();
        let mut best: Option<(&IndexSlot, &Owner, usize)> = None;

        for slot in self.index.slots() {
            let key = normalize_key(&slot.key);
            if key.chars().count().abs_diff(needle_len) > threshold {
                continue;
            }
            let Some(owner) = usable(slot, filter) else {
                continue;
            };
            let distance = edit_distance(needle, &key);
            if distance > threshold || best.is_some_and(|(_, _, d)| d <= distance) {
                continue;
            }
            best = Some((slot, owner, distance));
            if distance <= 1 {
                break;
            }
        }

        best.map(|(slot, owner, distance)| {
            Self::resolution(slot, owner, MatchStage::Approximate, distance)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityKind};
    use crate::player::{Player, PlayerCharacter};
    use crate::store::EntityStore;

    struct Fixture {
        index: TokenIndex,
        tree: BkTree,
        rules: DeclensionRules,
        config: ResolverConfig,
    }

    impl Fixture {
        fn new(entities: Vec<Entity>, players: &[Player]) -> Self {
            let rules = DeclensionRules::polish();
            let config = ResolverConfig::default();
            let index = TokenIndex::build(&EntityStore::from_entities(entities), players, &rules, &config);
            let tree = index.keys().map(normalize_key).collect();
            Self {
                index,
                tree,
                rules,
                config,
            }
        }

        fn with_tree(&self) -> Resolver<'_> {
            Resolver::new(&self.index, Some(&self.tree), &self.rules, &self.config)
        }

        fn without_tree(&self) -> Resolver<'_> {
            Resolver::new(&self.index, None, &self.rules, &self.config)
        }
    }

    fn world() -> Fixture {
        Fixture::new(
            vec![
                Entity::new("Xeron Demonlord", EntityKind::Person),
                Entity::new("Bracada", EntityKind::Place),
                Entity::new("Erathia", EntityKind::Place),
                Entity::new("Kupiec Orrin", EntityKind::Person),
                Entity::new("X", EntityKind::Person),
                Entity::new("X", EntityKind::Item),
            ],
            &[Player::new("Kasia").with_character(PlayerCharacter::new("Sandro"))],
        )
    }

    #[test]
    fn test_exact_is_case_insensitive() {
        let fixture = world();
        let resolver = fixture.with_tree();
        let upper = resolver.lookup(&Query::new("XERON DEMONLORD"), None).unwrap();
        assert_eq!(upper.stage, MatchStage::Exact);
        assert_eq!(upper.key, "Xeron Demonlord");
        assert_eq!(
            resolver.resolve("XERON DEMONLORD", None),
            resolver.resolve("Xeron Demonlord", None)
        );
    }

    #[test]
    fn test_declension_stage() {
        let fixture = world();
        let resolution = fixture.with_tree().lookup(&Query::new("Xeronowi Demonlordowi"), None).unwrap();
        assert_eq!(resolution.stage, MatchStage::Declension);
        assert_eq!(resolution.owner.name(), "Xeron Demonlord");

        let resolution = fixture.with_tree().lookup(&Query::new("Orrinowi"), None).unwrap();
        assert_eq!(resolution.stage, MatchStage::Declension);
        assert_eq!(resolution.owner.name(), "Kupiec Orrin");
    }

    #[test]
    fn test_alternation_stage() {
        let fixture = world();
        let resolution = fixture.with_tree().lookup(&Query::new("Bracadzie"), None).unwrap();
        assert_eq!(resolution.stage, MatchStage::Alternation);
        assert_eq!(resolution.key, "Bracada");
    }

    #[test]
    fn test_approximate_stage() {
        let fixture = world();
        for resolver in [fixture.with_tree(), fixture.without_tree()] {
            let resolution = resolver.lookup(&Query::new("Xeron Demonlors"), None).unwrap();
            assert_eq!(resolution.stage, MatchStage::Approximate);
            assert_eq!(resolution.owner.name(), "Xeron Demonlord");
            assert_eq!(resolution.distance, 1);
        }
    }

    #[test]
    fn test_short_query_budget() {
        let fixture = world();
        let resolver = fixture.with_tree();
        // "Sandor" is two edits from "Sandro"; six characters allow two.
        assert!(resolver.resolve("Sandor", None).is_some());
        // Four characters allow a single edit.
        assert!(resolver.resolve("Erth", None).is_none());
        let query = Query::new("Erth")
            .with_max_distance(3)
            .with_filter(EntityKind::Place);
        assert_eq!(resolver.lookup(&query, None).unwrap().key, "Erathia");
    }

    #[test]
    fn test_ambiguous_key_is_absent() {
        let fixture = world();
        let resolver = fixture.with_tree();
        assert!(resolver.resolve("X", None).is_none());
        assert!(resolver.resolve("X", Some(EntityKind::Person.into())).is_none());
    }

    #[test]
    fn test_filter_rejects_wrong_kind() {
        let fixture = world();
        let resolver = fixture.with_tree();
        assert!(resolver.resolve("Erathia", Some(EntityKind::Person.into())).is_none());
        assert!(resolver.resolve("Erathia", Some(EntityKind::Place.into())).is_some());
        assert!(matches!(
            resolver.resolve("sandro", Some(OwnerKind::Character)),
            Some(Owner::Character { .. })
        ));
    }

    #[test]
    fn test_cache_records_hits_and_misses() {
        let fixture = world();
        let resolver = fixture.with_tree();
        let mut cache = ResolutionCache::new();

        let found = Query::new("Erathia");
        let missing = Query::new("Zzyzx Qqq");
        assert!(resolver.lookup(&found, Some(&mut cache)).is_some());
        assert!(resolver.lookup(&missing, Some(&mut cache)).is_none());
        assert_eq!(cache.get(&missing), Some(&Cached::NoMatch));

        assert!(resolver.lookup(&found, Some(&mut cache)).is_some());
        assert_eq!(cache.len(), 2);
        assert!(cache.hits() >= 2);
    }

    #[test]
    fn test_empty_query() {
        let fixture = world();
        assert!(fixture.with_tree().resolve("   ", None).is_none());
    }
}
