//! Configuration for the preview engine

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Preview engine configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Minimum perceived latency for the merge-shape evaluation, in
    /// milliseconds
    #[serde(default = "default_delay_floor")]
    pub delay_floor_ms: u64,

    /// Whether tree-merge simulation runs at all; when disabled only the
    /// commit count is computed
    #[serde(default = "default_conflict_detection")]
    pub conflict_detection: bool,
}

const fn default_delay_floor() -> u64 {
    500
}

const fn default_conflict_detection() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_floor_ms: default_delay_floor(),
            conflict_detection: default_conflict_detection(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or parsing the config file fails
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Default config file location (`$HOME/.config/mergelens.json`)
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
            .join(".config")
            .join("mergelens.json")
    }

    /// Delay floor as a [`Duration`]
    #[must_use]
    pub const fn delay_floor(&self) -> Duration {
        Duration::from_millis(self.delay_floor_ms)
    }
}
