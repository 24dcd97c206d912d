//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level command line.
#[derive(Parser)]
#[command(name = "terma")]
#[command(about = "Transparent shell relay with fuzzy command suggestions")]
#[command(version)]
pub struct Cli {
    /// Vocabulary file to use instead of the default location
    #[arg(long, global = true)]
    pub vocab: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands; omitting one runs a relay session.
#[derive(Subcommand)]
pub enum Commands {
    /// Relay a shell session with suggestions (the default)
    Run {
        /// Shell to drive (defaults to $SHELL, then /bin/bash)
        #[arg(short, long)]
        shell: Option<String>,

        /// Maximum edit distance for suggestions
        #[arg(short, long)]
        threshold: Option<usize>,

        /// Re-enumerate PATH even if a vocabulary file exists
        #[arg(long)]
        rebuild: bool,
    },

    /// Query the vocabulary for fuzzy matches
    Query {
        /// Query term
        term: String,

        /// Maximum edit distance
        #[arg(short, long)]
        threshold: Option<usize>,

        /// Show distances in results
        #[arg(short = 'd', long)]
        show_distances: bool,
    },

    /// Re-enumerate PATH and rewrite the vocabulary file
    Rebuild,
}
