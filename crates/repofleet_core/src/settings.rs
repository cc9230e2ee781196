use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILENAME: &str = "repofleet.toml";
pub const DEFAULT_GH_BINARY: &str = "gh";
pub const DEFAULT_OUTPUT_DIR: &str = "findings";

pub const DEFAULT_TOPIC_WORKERS: usize = 10;
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 5;
pub const DEFAULT_GHAS_WORKERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Topics,
    Download,
    Ghas,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub gh: GhSection,
    #[serde(default)]
    pub workers: WorkersSection,
    #[serde(default)]
    pub download: DownloadSection,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct GhSection {
    pub binary: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct WorkersSection {
    pub topics: Option<usize>,
    pub download: Option<usize>,
    pub ghas: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct DownloadSection {
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolve the gh executable: env REPOFLEET_GH_BIN > settings > "gh".
    pub fn gh_binary(&self) -> String {
        if let Ok(value) = env::var("REPOFLEET_GH_BIN") {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
        self.gh
            .binary
            .clone()
            .unwrap_or_else(|| DEFAULT_GH_BINARY.to_string())
    }

    /// Resolve the worker count for a tool: flag > settings > tool default.
    pub fn workers(&self, tool: Tool, flag: Option<usize>) -> usize {
        if let Some(value) = flag {
            return value;
        }
        let (configured, default) = match tool {
            Tool::Topics => (self.workers.topics, DEFAULT_TOPIC_WORKERS),
            Tool::Download => (self.workers.download, DEFAULT_DOWNLOAD_WORKERS),
            Tool::Ghas => (self.workers.ghas, DEFAULT_GHAS_WORKERS),
        };
        configured.unwrap_or(default)
    }

    /// Resolve the download directory: flag > settings > "findings".
    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        if let Some(path) = flag {
            return path.to_path_buf();
        }
        self.download
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

/// Pick the settings file: explicit path > env REPOFLEET_SETTINGS > ./repofleet.toml.
pub fn settings_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(value) = env::var("REPOFLEET_SETTINGS") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    cwd.join(DEFAULT_SETTINGS_FILENAME)
}

/// Load settings from a TOML file. Returns defaults if the file doesn't exist.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: Settings =
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}
