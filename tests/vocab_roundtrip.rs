//! Vocabulary resolution round trip through the CLI layer.

use terma::cli::commands::resolve_vocabulary;
use terma::cli::paths::Config;

#[test]
fn first_run_enumerates_then_subsequent_runs_load_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vocab.txt");
    let config = Config {
        vocab_path: Some(path.clone()),
        ..Config::default()
    };

    // No file yet: enumeration runs and persists its result.
    let (enumerated, written_to) = resolve_vocabulary(&config, false).unwrap();
    assert_eq!(written_to, path);
    assert!(path.exists());

    // Second resolution reads the file back, bit for bit.
    let (loaded, _) = resolve_vocabulary(&config, false).unwrap();
    assert_eq!(loaded, enumerated);
}

#[test]
fn rebuild_overwrites_a_stale_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vocab.txt");
    std::fs::write(&path, "stale-entry\n").unwrap();

    let config = Config {
        vocab_path: Some(path.clone()),
        ..Config::default()
    };

    let (words, _) = resolve_vocabulary(&config, true).unwrap();
    let on_disk = std::fs::read_to_string(&path).unwrap();

    assert!(!words.contains(&"stale-entry".to_string()));
    assert!(!on_disk.contains("stale-entry"));
}
