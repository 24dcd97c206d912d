//! terma - transparent shell relay with fuzzy command suggestions
//!
//! Spawns the user's shell on a pseudo-terminal and relays the session,
//! injecting suggestions when a command is not found.

use clap::Parser;
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use std::process;

use terma::cli::commands;
use terma::cli::paths::Config;
use terma::cli::{Cli, Commands};
use terma::index::DEFAULT_MAX_DISTANCE;
use terma::pty::{self, RawModeGuard};
use terma::relay::SessionRelay;
use terma::suggest::{SuggestionEngine, DEFAULT_THRESHOLD};
use terma::vocab;
use tracing_subscriber::EnvFilter;

/// Fallback when neither the config nor $SHELL names a shell.
const DEFAULT_SHELL: &str = "/bin/bash";

fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        None => run_session(cli.vocab, None, None, false),
        Some(Commands::Run {
            shell,
            threshold,
            rebuild,
        }) => run_session(cli.vocab, shell, threshold, rebuild),
        Some(other) => commands::execute(other, cli.vocab),
    };

    if let Err(e) = result {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }
}

/// Diagnostics go to stderr so they never interleave with the relayed
/// terminal byte stream; default level warn, overridable via TERMA_LOG.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TERMA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn run_session(
    vocab_cli: Option<PathBuf>,
    shell_cli: Option<String>,
    threshold_cli: Option<usize>,
    rebuild: bool,
) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let config = config.merge_with_cli(&Config {
        shell: shell_cli,
        vocab_path: vocab_cli,
        threshold: threshold_cli,
        max_distance: None,
    });

    let (words, vocab_path) = commands::resolve_vocabulary(&config, rebuild)?;
    let (tree, skipped) = vocab::build_tree(
        words.into_iter(),
        config.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
    );
    if skipped > 0 {
        tracing::warn!(skipped, "vocabulary entries dropped during indexing");
    }

    let shell = config
        .shell
        .clone()
        .or_else(|| std::env::var("SHELL").ok())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());

    println!(
        "{} {} command(s) indexed from {}; relaying {}",
        "terma:".cyan().bold(),
        tree.len().to_string().green(),
        vocab_path.display(),
        shell.bold()
    );

    let engine =
        SuggestionEngine::with_threshold(tree, config.threshold.unwrap_or(DEFAULT_THRESHOLD));
    let mut relay = SessionRelay::new(engine);

    let mut session = pty::spawn_shell(&shell)?;
    let raw_guard = RawModeGuard::new()?;

    let mut stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = relay.run(&mut stdin, &mut stdout, session.master_mut());

    // Restore the terminal before reaping or reporting anything.
    drop(raw_guard);
    session.wait()?;
    result?;

    println!("{} session ended", "terma:".cyan().bold());
    Ok(())
}
