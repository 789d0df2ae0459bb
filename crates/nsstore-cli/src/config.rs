use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding the file backend.
    pub data_dir: PathBuf,
    /// Substitute defaults for missing fields in `get-batch` without `--force`.
    pub force_defaults: bool,
    /// Log filter used when `RUST_LOG` is unset and `-v` is not given.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".nsstore"),
            force_defaults: false,
            log_level: "warn".into(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid nsstore configuration")
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
