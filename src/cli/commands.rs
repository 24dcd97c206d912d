//! CLI command execution

use super::args::Commands;
use super::paths::{default_vocab_path, Config};
use crate::index::DEFAULT_MAX_DISTANCE;
use crate::suggest::{SuggestionEngine, DEFAULT_THRESHOLD};
use crate::vocab;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// Resolve the vocabulary: load the flat file when present, otherwise
/// (or when `rebuild` forces it) enumerate the search path and persist
/// the result for the next start.
pub fn resolve_vocabulary(config: &Config, rebuild: bool) -> Result<(Vec<String>, PathBuf)> {
    let path = match &config.vocab_path {
        Some(path) => path.clone(),
        None => default_vocab_path()?,
    };

    if !rebuild && path.exists() {
        let words = vocab::load(&path)
            .with_context(|| format!("Failed to load vocabulary: {}", path.display()))?;
        tracing::debug!(count = words.len(), path = %path.display(), "loaded vocabulary");
        return Ok((words, path));
    }

    let words = vocab::enumerate_path();
    vocab::save(&path, words.iter().map(String::as_str))
        .with_context(|| format!("Failed to save vocabulary: {}", path.display()))?;
    tracing::debug!(count = words.len(), path = %path.display(), "enumerated and saved vocabulary");
    Ok((words, path))
}

/// Execute a non-session subcommand.
pub fn execute(command: Commands, vocab_override: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Query {
            term,
            threshold,
            show_distances,
        } => query_command(vocab_override, term, threshold, show_distances),
        Commands::Rebuild => rebuild_command(vocab_override),
        Commands::Run { .. } => unreachable!("Run is handled by the binary entry point"),
    }
}

fn query_command(
    vocab_override: Option<PathBuf>,
    term: String,
    threshold: Option<usize>,
    show_distances: bool,
) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let config = config.merge_with_cli(&Config {
        vocab_path: vocab_override,
        threshold,
        ..Config::default()
    });

    let (words, _) = resolve_vocabulary(&config, false)?;
    let (tree, _) = vocab::build_tree(
        words.into_iter(),
        config.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
    );

    let engine =
        SuggestionEngine::with_threshold(tree, config.threshold.unwrap_or(DEFAULT_THRESHOLD));

    let Some(matches) = engine.suggest(&term) else {
        anyhow::bail!("query term is empty after sanitization");
    };

    if matches.is_empty() {
        println!("{}", "No matches".yellow());
        return Ok(());
    }

    for entry in &matches {
        if show_distances {
            println!("{} ({})", entry.term.green(), entry.distance);
        } else {
            println!("{}", entry.term.green());
        }
    }
    Ok(())
}

fn rebuild_command(vocab_override: Option<PathBuf>) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let config = config.merge_with_cli(&Config {
        vocab_path: vocab_override,
        ..Config::default()
    });

    let (words, path) = resolve_vocabulary(&config, true)?;
    println!(
        "Saved {} command(s) to {}",
        words.len().to_string().green().bold(),
        path.display().to_string().cyan()
    );
    Ok(())
}
