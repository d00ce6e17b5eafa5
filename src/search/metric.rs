//! String metrics.

/// A distance function over strings that satisfies the metric axioms.
///
/// BK-tree pruning relies on the triangle inequality; an implementation that
/// violates it makes the tree miss matches.
pub trait Metric: Send + Sync {
    /// Distance between `a` and `b`.
    fn distance(&self, a: &str, b: &str) -> usize;
}

/// Levenshtein distance over Unicode scalar values.
///
/// Polish diacritics count as distinct characters: `ł` → `l` is one edit.
#[derive(Debug, Default, Clone, Copy)]
pub struct Levenshtein;

impl Metric for Levenshtein {
    fn distance(&self, a: &str, b: &str) -> usize {
        edit_distance(a, b)
    }
}

/// Levenshtein distance with a two-row table.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
