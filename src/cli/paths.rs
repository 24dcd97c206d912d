//! Default paths and persistent configuration

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the configuration directory for terma
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("Could not determine local data directory")?;
    Ok(base.join("terma"))
}

/// Default location of the persisted vocabulary
pub fn default_vocab_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("vocab.txt"))
}

/// Location of the persistent config file
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Persistent user configuration.
///
/// Every field is optional; unset fields fall back to built-in defaults
/// at the point of use, and command-line options take precedence over
/// everything.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Shell to drive
    pub shell: Option<String>,
    /// Vocabulary file location
    pub vocab_path: Option<PathBuf>,
    /// Suggestion threshold (maximum edit distance)
    pub threshold: Option<usize>,
    /// Index distance bound
    pub max_distance: Option<usize>,
}

impl Config {
    /// Load configuration, returning defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to the config file.
    pub fn save(&self) -> Result<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Merge with command-line options (CLI options take precedence).
    pub fn merge_with_cli(&self, overrides: &Config) -> Config {
        Config {
            shell: overrides.shell.clone().or_else(|| self.shell.clone()),
            vocab_path: overrides
                .vocab_path
                .clone()
                .or_else(|| self.vocab_path.clone()),
            threshold: overrides.threshold.or(self.threshold),
            max_distance: overrides.max_distance.or(self.max_distance),
        }
    }
}
