//! Metric index over the command vocabulary.
//!
//! A BK-tree: each node holds one pivot term, and children are keyed by
//! their edit distance from that pivot. Because the Levenshtein distance
//! satisfies the triangle inequality, a radius query can prune every
//! subtree whose key falls outside `[d - threshold, d + threshold]`,
//! where `d` is the distance between the query and the current pivot.
//!
//! Distinct insertion orders can produce structurally different trees;
//! query results are the same either way.

mod match_list;

pub use match_list::{Match, MatchList};

use crate::distance::levenshtein;
use std::collections::BTreeMap;

/// Default bound on the distance between a term and any pivot on its
/// insertion path. One explicit constant shared by insertion and query,
/// rather than a hard-coded child-array size.
pub const DEFAULT_MAX_DISTANCE: usize = 30;

/// Errors from index operations.
///
/// Both kinds are per-item: vocabulary loading logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A term's distance from a pivot on its insertion path reached the
    /// index bound; the insertion is dropped and the tree is unchanged.
    #[error("distance {distance} to {word:?} exceeds the index bound")]
    DistanceOverflow {
        /// The rejected term
        word: String,
        /// The offending distance
        distance: usize,
    },
    /// Empty terms cannot be indexed.
    #[error("empty terms cannot be indexed")]
    EmptyWord,
}

#[derive(Debug, Clone)]
struct BkNode {
    pivot: String,
    children: BTreeMap<usize, BkNode>,
}

impl BkNode {
    fn new(pivot: String) -> Self {
        Self {
            pivot,
            children: BTreeMap::new(),
        }
    }
}

/// BK-tree over the command vocabulary.
///
/// The tree is seeded with a sentinel pivot at construction and is never
/// empty. It is built once at startup and read-only afterwards; queries
/// take `&self`.
///
/// # Example
///
/// ```
/// use terma::index::BkTree;
///
/// let mut tree = BkTree::new("terma");
/// tree.insert("git").unwrap();
/// tree.insert("grep").unwrap();
///
/// let matches = tree.query("gti", 2);
/// assert_eq!(matches.terms().collect::<Vec<_>>(), ["git"]);
/// ```
#[derive(Debug, Clone)]
pub struct BkTree {
    root: BkNode,
    max_distance: usize,
    len: usize,
}

impl BkTree {
    /// Create a tree seeded with `root_term`, using
    /// [`DEFAULT_MAX_DISTANCE`] as the distance bound.
    pub fn new(root_term: &str) -> Self {
        Self::with_max_distance(root_term, DEFAULT_MAX_DISTANCE)
    }

    /// Create a tree with a custom distance bound.
    ///
    /// # Panics
    ///
    /// Panics if `max_distance` is zero; a zero bound would reject every
    /// insertion.
    pub fn with_max_distance(root_term: &str, max_distance: usize) -> Self {
        assert!(max_distance > 0, "distance bound must be positive");
        Self {
            root: BkNode::new(root_term.to_string()),
            max_distance,
            len: 1,
        }
    }

    /// The distance bound shared by insertion and query pruning.
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// Number of terms in the tree, counting the sentinel pivot.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds only the sentinel pivot.
    pub fn is_empty(&self) -> bool {
        self.len <= 1
    }

    /// Insert a term.
    ///
    /// Walks from the root: at each pivot the edit distance selects the
    /// child slot to descend into, or the term becomes a new leaf if the
    /// slot is vacant. Re-inserting a known term is a no-op. The distance
    /// bound is checked before any node is attached, so a failed insert
    /// leaves the tree untouched.
    pub fn insert(&mut self, word: &str) -> Result<(), IndexError> {
        if word.is_empty() {
            return Err(IndexError::EmptyWord);
        }

        let mut node = &mut self.root;
        loop {
            let d = levenshtein(&node.pivot, word);
            if d == 0 {
                // Already present
                return Ok(());
            }
            if d >= self.max_distance {
                return Err(IndexError::DistanceOverflow {
                    word: word.to_string(),
                    distance: d,
                });
            }
            if node.children.contains_key(&d) {
                node = node.children.get_mut(&d).unwrap();
            } else {
                node.children.insert(d, BkNode::new(word.to_string()));
                self.len += 1;
                return Ok(());
            }
        }
    }

    /// Radius query: every term within `threshold` edits of `target`,
    /// ranked ascending by distance.
    ///
    /// Subtrees whose key lies outside the triangle-inequality band
    /// around the current pivot's distance are skipped; every other node
    /// is visited at most once.
    pub fn query(&self, target: &str, threshold: usize) -> MatchList {
        let mut results = MatchList::new();
        let mut pending = vec![&self.root];

        while let Some(node) = pending.pop() {
            let d = levenshtein(&node.pivot, target);
            if d <= threshold {
                results.insert(node.pivot.clone(), d);
            }

            let lo = d.saturating_sub(threshold);
            let hi = d + threshold;
            for child in node.children.range(lo..=hi).map(|(_, c)| c) {
                pending.push(child);
            }
        }

        results
    }

    /// All terms in the tree, in depth-first order.
    ///
    /// Used to persist the vocabulary; the order is structural, not
    /// meaningful.
    pub fn terms(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            out.push(node.pivot.clone());
            pending.extend(node.children.values());
        }
        out
    }
}
