//! Suggestion queries and prefix autocomplete.
//!
//! The [`SuggestionEngine`] orchestrates a query: it sanitizes the failed
//! token, walks the metric index, and hands back a fresh [`MatchList`]
//! that the session keeps as its most recent result. Autocomplete runs
//! against that last list only, never against the whole vocabulary:
//! completion targets recently-suggested commands.

use crate::index::{BkTree, MatchList};

/// Default edit-distance threshold for first-attempt matching.
pub const DEFAULT_THRESHOLD: usize = 2;

/// Outcome of a prefix-completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// No entry in the last match list has the buffer as a prefix.
    NoMatch,
    /// Exactly one entry matches; the caller should replace the buffer
    /// with it.
    Unique(String),
    /// Several entries match; the caller should display them and leave
    /// the buffer unchanged.
    Ambiguous(Vec<String>),
}

/// Canonical form of a raw token: control characters stripped,
/// surrounding whitespace trimmed.
///
/// Tokens arrive from terminal lines and may carry escape bytes or a
/// trailing newline; the index only ever sees the sanitized form.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Query orchestrator over a read-only [`BkTree`].
pub struct SuggestionEngine {
    tree: BkTree,
    threshold: usize,
}

impl SuggestionEngine {
    /// Create an engine with the default threshold of
    /// [`DEFAULT_THRESHOLD`] edits.
    pub fn new(tree: BkTree) -> Self {
        Self::with_threshold(tree, DEFAULT_THRESHOLD)
    }

    /// Create an engine with a caller-chosen threshold.
    pub fn with_threshold(tree: BkTree, threshold: usize) -> Self {
        Self { tree, threshold }
    }

    /// The per-query edit-distance threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// The indexed vocabulary.
    pub fn tree(&self) -> &BkTree {
        &self.tree
    }

    /// Suggest near-matches for a failed command token.
    ///
    /// Returns `None` when the sanitized token is empty: an empty query
    /// produces no suggestion and is not an error. The returned list is
    /// fresh and owned by the caller.
    pub fn suggest(&self, token: &str) -> Option<MatchList> {
        let token = sanitize(token);
        if token.is_empty() {
            return None;
        }
        Some(self.tree.query(&token, self.threshold))
    }

    /// Complete `partial` against the most recent match list.
    ///
    /// Scans `last` in rank order for entries with `partial` as a
    /// prefix. An empty partial buffer never completes: matching
    /// everything is indistinguishable from matching nothing useful.
    pub fn complete(&self, last: &MatchList, partial: &str) -> Completion {
        if partial.is_empty() {
            return Completion::NoMatch;
        }

        let candidates: Vec<String> = last
            .terms()
            .filter(|term| term.starts_with(partial))
            .map(String::from)
            .collect();

        match candidates.len() {
            0 => Completion::NoMatch,
            1 => Completion::Unique(candidates.into_iter().next().unwrap()),
            _ => Completion::Ambiguous(candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SuggestionEngine {
        let mut tree = BkTree::new("terma");
        for word in ["list", "grep", "git", "install", "instant"] {
            tree.insert(word).unwrap();
        }
        SuggestionEngine::new(tree)
    }

    fn last_matches(words: &[&str]) -> MatchList {
        let mut list = MatchList::new();
        for (i, w) in words.iter().enumerate() {
            list.insert(w.to_string(), i);
        }
        list
    }

    #[test]
    fn suggest_finds_near_match() {
        let engine = engine();
        let matches = engine.suggest("gti").unwrap();

        let terms: Vec<_> = matches.terms().collect();
        assert!(terms.contains(&"git"));
        assert!(!terms.contains(&"list"));
    }

    #[test]
    fn suggest_sanitizes_before_querying() {
        let engine = engine();
        let matches = engine.suggest("  gti\r\n").unwrap();
        assert!(matches.terms().any(|t| t == "git"));
    }

    #[test]
    fn empty_token_yields_no_query() {
        let engine = engine();
        assert!(engine.suggest("").is_none());
        assert!(engine.suggest("  \t\r\n").is_none());
    }

    #[test]
    fn sanitize_strips_control_bytes() {
        assert_eq!(sanitize("g\x1bti\n"), "gti");
        assert_eq!(sanitize("  ls "), "ls");
    }

    #[test]
    fn complete_unique() {
        let engine = engine();
        let last = last_matches(&["install", "instant"]);
        assert_eq!(
            engine.complete(&last, "instal"),
            Completion::Unique("install".to_string())
        );
    }

    #[test]
    fn complete_ambiguous_preserves_rank_order() {
        let engine = engine();
        let last = last_matches(&["install", "instant"]);
        assert_eq!(
            engine.complete(&last, "insta"),
            Completion::Ambiguous(vec!["install".to_string(), "instant".to_string()])
        );
    }

    #[test]
    fn complete_no_match() {
        let engine = engine();
        let last = last_matches(&["install", "instant"]);
        assert_eq!(engine.complete(&last, "xyz"), Completion::NoMatch);
    }

    #[test]
    fn complete_empty_buffer_is_no_match() {
        let engine = engine();
        let last = last_matches(&["install", "instant"]);
        assert_eq!(engine.complete(&last, ""), Completion::NoMatch);
    }

    #[test]
    fn complete_ignores_the_wider_vocabulary() {
        // "grep" is indexed but absent from the last match list, so it
        // must not complete.
        let engine = engine();
        let last = last_matches(&["install"]);
        assert_eq!(engine.complete(&last, "gre"), Completion::NoMatch);
    }
}
