//! Vocabulary sources and index construction.
//!
//! The vocabulary is the set of known command names. It comes from one
//! of two places: a persisted flat file (newline-delimited, one command
//! per line), or a fresh enumeration of the executable search path. The
//! file format is deliberately plain so it can be inspected and edited
//! by hand.
//!
//! Index construction is forgiving per item: a term the index rejects
//! (empty after sanitization, or past the distance bound) is logged and
//! skipped, and the build carries on. A stale or missing entry only ever
//! costs a suggestion.

use crate::index::BkTree;
use crate::suggest::sanitize;
use rustc_hash::FxHashSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Errors from vocabulary persistence.
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    /// The vocabulary file could not be read.
    #[error("failed to read vocabulary file {path}")]
    Read {
        /// The file that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The vocabulary file could not be written.
    #[error("failed to write vocabulary file {path}")]
    Write {
        /// The file that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Load a vocabulary from a newline-delimited file.
///
/// Empty lines are skipped; everything else is kept verbatim (the index
/// build sanitizes later).
pub fn load(path: &Path) -> Result<Vec<String>, VocabError> {
    let file = File::open(path).map_err(|source| VocabError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut words = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| VocabError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if !line.is_empty() {
            words.push(line);
        }
    }
    Ok(words)
}

/// Write a vocabulary as a newline-delimited file, one term per line.
///
/// Parent directories are created as needed.
pub fn save<'a, I>(path: &Path, words: I) -> Result<(), VocabError>
where
    I: IntoIterator<Item = &'a str>,
{
    let wrap = |source| VocabError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(wrap)?);
    for word in words {
        writeln!(writer, "{}", word).map_err(wrap)?;
    }
    writer.flush().map_err(wrap)
}

/// Enumerate command names from the executable search path.
///
/// Walks every `PATH` component, collecting file and symlink names,
/// skipping hidden entries, deduplicating across directories.
/// Unreadable directories are logged and skipped; enumeration itself
/// never fails.
pub fn enumerate_path() -> Vec<String> {
    enumerate_from(std::env::var_os("PATH"))
}

fn enumerate_from(search_path: Option<OsString>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut words = Vec::new();

    let Some(search_path) = search_path else {
        tracing::warn!("PATH is unset; vocabulary will be empty");
        return words;
    };

    for dir in std::env::split_paths(&search_path) {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "skipping unreadable PATH entry");
                continue;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') {
                continue;
            }
            // Directories under PATH are not commands.
            if let Ok(file_type) = entry.file_type() {
                if !file_type.is_file() && !file_type.is_symlink() {
                    continue;
                }
            }
            if seen.insert(name.to_string()) {
                words.push(name.to_string());
            }
        }
    }

    words
}

/// Build the metric index from a vocabulary.
///
/// Terms are sanitized first; terms the index rejects are logged and
/// skipped. Returns the tree and the number of skipped terms. Insertion
/// order follows the input and is not significant for query results.
pub fn build_tree<I>(words: I, max_distance: usize) -> (BkTree, usize)
where
    I: IntoIterator<Item = String>,
{
    let mut tree = BkTree::with_max_distance(env!("CARGO_PKG_NAME"), max_distance);
    let mut skipped = 0;

    for raw in words {
        let word = sanitize(&raw);
        if word.is_empty() {
            tracing::warn!(raw = %raw, "dropping empty vocabulary entry");
            skipped += 1;
            continue;
        }
        if let Err(err) = tree.insert(&word) {
            tracing::warn!(%err, "dropping vocabulary entry");
            skipped += 1;
        }
    }

    (tree, skipped)
}
