//! # terma
//!
//! Transparent shell relay with fuzzy command suggestions.
//!
//! terma sits between the user's terminal and a shell running on a
//! pseudo-terminal, forwarding bytes in both directions. Command names
//! from the executable search path are indexed in a BK-tree keyed by
//! Levenshtein distance; when the shell reports `command not found`,
//! the closest vocabulary entries are offered, and a tab completes the
//! current line against the latest suggestions.
//!
//! ## Example
//!
//! ```rust
//! use terma::prelude::*;
//!
//! let mut tree = BkTree::new("terma");
//! for term in ["list", "grep", "git"] {
//!     tree.insert(term).unwrap();
//! }
//!
//! let engine = SuggestionEngine::new(tree);
//! let matches = engine.suggest("gti").unwrap();
//! assert_eq!(matches.terms().next(), Some("git"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod distance;
pub mod index;
pub mod pty;
pub mod relay;
pub mod suggest;
pub mod vocab;

/// Common imports for convenient usage
pub mod prelude {
    pub use crate::distance::levenshtein;
    pub use crate::index::{BkTree, IndexError, Match, MatchList, DEFAULT_MAX_DISTANCE};
    pub use crate::relay::{RelayError, SessionRelay};
    pub use crate::suggest::{sanitize, Completion, SuggestionEngine, DEFAULT_THRESHOLD};
}
