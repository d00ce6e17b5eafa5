//! BK-tree over index keys.
//!
//! Each node's children are keyed by their distance to the node. A search at
//! threshold `t` that measures distance `d` at a node only needs to descend
//! into children whose edge distance lies in `[d - t, d + t]`; the triangle
//! inequality rules out every other subtree.

use std::collections::BTreeMap;

use crate::search::metric::{Levenshtein, Metric};

#[derive(Debug, Clone)]
struct Node {
    key: String,
    children: BTreeMap<usize, usize>,
}

/// A key found within the search threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchHit<'a> {
    /// The stored key.
    pub key: &'a str,
    /// Distance from the query.
    pub distance: usize,
}

/// Metric tree supporting bounded edit-distance queries.
///
/// Nodes live in an arena and are visited with an explicit stack, so neither
/// insertion nor search recurses.
///
/// # Examples
///
/// ```
/// use kronika::search::BkTree;
///
/// let tree: BkTree = ["enroth", "erathia", "deyja"].into_iter().collect();
/// let hits = tree.search("erathya", 1);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].key, "erathia");
/// ```
#[derive(Debug, Clone)]
pub struct BkTree<M: Metric = Levenshtein> {
    nodes: Vec<Node>,
    metric: M,
}

impl BkTree<Levenshtein> {
    /// Creates an empty tree using Levenshtein distance.
    #[must_use]
    pub fn new() -> Self {
        Self::with_metric(Levenshtein)
    }
}

impl Default for BkTree<Levenshtein> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> BkTree<M> {
    /// Creates an empty tree over a custom metric.
    #[must_use]
    pub const fn with_metric(metric: M) -> Self {
        Self {
            nodes: Vec::new(),
            metric,
        }
    }

    /// Inserts a key; returns false if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.nodes.is_empty() {
            self.nodes.push(Node {
                key,
                children: BTreeMap::new(),
            });
            return true;
        }

        let mut current = 0;
        loop {
            let distance = self.metric.distance(&self.nodes[current].key, &key);
            if distance == 0 {
                return false;
            }
            match self.nodes[current].children.get(&distance) {
                Some(&child) => current = child,
                None => {
                    let idx = self.nodes.len();
                    self.nodes.push(Node {
                        key,
                        children: BTreeMap::new(),
                    });
                    self.nodes[current].children.insert(distance, idx);
                    return true;
                }
            }
        }
    }

    /// Returns every key within `threshold` of `query`.
    ///
    /// Hits come in traversal order, which is deterministic for a given
    /// insertion order.
    #[must_use]
    pub fn search(&self, query: &str, threshold: usize) -> Vec<SearchHit<'_>> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            let distance = self.metric.distance(query, &node.key);
            if distance <= threshold {
                hits.push(SearchHit {
                    key: &node.key,
                    distance,
                });
            }
            let lo = distance.saturating_sub(threshold);
            let hi = distance + threshold;
            // Reversed so the nearest band is popped first.
            for (_, &child) in node.children.range(lo..=hi).rev() {
                stack.push(child);
            }
        }
        hits
    }

    /// Returns true if `key` is stored in the tree.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.search(key, 0).iter().any(|hit| hit.key == key)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over stored keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.key.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for BkTree<Levenshtein> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tree = Self::new();
        for key in iter {
            tree.insert(key);
        }
        tree
    }
}

/// Brute-force reference: every key within `threshold` of `query`.
#[must_use]
pub fn linear_scan<'a, M: Metric>(
    keys: impl IntoIterator<Item = &'a str>,
    query: &str,
    threshold: usize,
    metric: &M,
) -> Vec<SearchHit<'a>> {
    keys.into_iter()
        .filter_map(|key| {
            let distance = metric.distance(query, key);
            (distance <= threshold).then_some(SearchHit { key, distance })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    fn key_set(hits: &[SearchHit<'_>]) -> BTreeSet<(String, usize)> {
        hits.iter().map(|h| (h.key.to_string(), h.distance)).collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = BkTree::new();
        assert!(tree.is_empty());
        assert!(tree.search("enroth", 3).is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut tree = BkTree::new();
        assert!(tree.insert("enroth"));
        assert!(tree.insert("erathia"));
        assert!(!tree.insert("enroth"));
        assert_eq!(tree.len(), 2);
        assert!(tree.contains("erathia"));
        assert!(!tree.contains("eratia"));
    }

    #[test]
    fn test_search_returns_all_matches() {
        let tree: BkTree = ["xeron", "xeron demonlord", "xerox", "zenon", "deyja"]
            .into_iter()
            .collect();
        let hits = tree.search("xeron", 1);
        let keys: BTreeSet<_> = hits.iter().map(|h| h.key).collect();
        assert_eq!(keys, BTreeSet::from(["xeron", "xerox"]));
    }

    #[test]
    fn test_search_threshold_zero_is_exact() {
        let tree: BkTree = ["bracada", "bracadzie"].into_iter().collect();
        let hits = tree.search("bracada", 0);
        assert_eq!(hits, vec![SearchHit { key: "bracada", distance: 0 }]);
    }

    #[test]
    fn test_matches_linear_scan_on_fixed_set() {
        let keys = [
            "enroth", "erathia", "antagarich", "steadwick", "harmondale", "deyja", "bracada",
            "nighon", "tatalia", "krewlod", "avlee",
        ];
        let tree: BkTree = keys.into_iter().collect();
        for query in ["eroth", "stedwik", "bracadzie", "x", "tatalja"] {
            for threshold in 0..4 {
                let from_tree = key_set(&tree.search(query, threshold));
                let from_scan = key_set(&linear_scan(keys, query, threshold, &Levenshtein));
                assert_eq!(from_tree, from_scan, "query={query} threshold={threshold}");
            }
        }
    }

    proptest! {
        #[test]
        fn search_equals_linear_scan(
            keys in prop::collection::vec("[abcdeł]{0,7}", 0..40),
            query in "[abcdeł]{0,7}",
            threshold in 0usize..4,
        ) {
            let tree: BkTree = keys.iter().cloned().collect();
            let mut unique: Vec<&str> = Vec::new();
            for key in &keys {
                if !unique.contains(&key.as_str()) {
                    unique.push(key);
                }
            }
            let from_tree = key_set(&tree.search(&query, threshold));
            let from_scan = key_set(&linear_scan(unique, &query, threshold, &Levenshtein));
            prop_assert_eq!(from_tree, from_scan);
        }
    }
}
