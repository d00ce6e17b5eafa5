//! Approximate string search: metrics and the BK-tree built on them.

mod bktree;
mod metric;

pub use bktree::{linear_scan, BkTree, SearchHit};
pub use metric::{edit_distance, Levenshtein, Metric};
