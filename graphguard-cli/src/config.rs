//! CLI configuration handling.
//!
//! `graphguard.toml`, discovered in the working directory, supplies default
//! dataset/policy paths and a default output format. CLI flags always take
//! precedence over a loaded config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliResult;

/// Default config file name (lives in the working directory)
pub const CONFIG_FILE_NAME: &str = "graphguard.toml";

/// graphguard CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default Turtle dataset path, used when `--dataset` is not given
    pub dataset: Option<PathBuf>,

    /// Default policy file path, used when `--policy` is not given
    pub policy: Option<PathBuf>,

    /// Default output format (`"text"` or `"json"`), used when `--format` is not given
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `graphguard.toml` from the working directory if present,
    /// otherwise return the default (empty) config. A missing config file
    /// is not an error: every field it could supply has a CLI-flag
    /// equivalent.
    pub fn discover() -> CliResult<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
