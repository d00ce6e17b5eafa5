//! Per-batch memo of resolution results.

use std::collections::HashMap;

use crate::index::OwnerKind;
use crate::resolver::{Query, Resolution};

/// A remembered outcome.
///
/// `NoMatch` is stored explicitly, so a miss is never confused with a query
/// that has not been looked up yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached {
    /// The query resolved.
    Found(Resolution),
    /// Every stage came up empty.
    NoMatch,
}

impl Cached {
    /// Converts back into the resolver's return shape.
    #[must_use]
    pub fn into_resolution(self) -> Option<Resolution> {
        match self {
            Self::Found(resolution) => Some(resolution),
            Self::NoMatch => None,
        }
    }
}

impl From<Option<Resolution>> for Cached {
    fn from(result: Option<Resolution>) -> Self {
        result.map_or(Self::NoMatch, Self::Found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    filter: Option<OwnerKind>,
    max_distance: Option<usize>,
}

impl From<&Query> for CacheKey {
    fn from(query: &Query) -> Self {
        Self {
            text: query.text.clone(),
            filter: query.filter,
            max_distance: query.max_distance,
        }
    }
}

/// Results keyed by query text and type filter.
///
/// The same text resolves independently under each filter. A cache is scoped
/// to one batch over one identity space and is dropped afterwards; callers
/// resolving concurrently hold one cache each.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: HashMap<CacheKey, Cached>,
    hits: usize,
    misses: usize,
}

impl ResolutionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remembered outcome, or `None` if never looked up.
    pub fn get(&mut self, query: &Query) -> Option<&Cached> {
        let found = self.entries.get(&CacheKey::from(query));
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Remembers the outcome of `query`.
    pub fn insert(&mut self, query: &Query, outcome: Cached) {
        self.entries.insert(CacheKey::from(query), outcome);
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> usize {
        self.hits
    }

    /// Lookups not yet cached.
    #[must_use]
    pub const fn misses(&self) -> usize {
        self.misses
    }

    /// Number of remembered queries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every outcome and resets the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
