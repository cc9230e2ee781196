use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::FleetError;

pub const DEFAULT_FLEET_FILE: &str = "repos.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredLists {
    Repos,
    ReposAndTopics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetConfig {
    pub repos: Vec<String>,
    pub topics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawFleetConfig {
    repos: Option<Vec<String>>,
    topics: Option<Vec<String>>,
}

/// Load the fleet file. Required lists must be present and non-empty.
pub fn load_fleet_config(path: &Path, required: RequiredLists) -> Result<FleetConfig, FleetError> {
    let content = fs::read_to_string(path).map_err(|source| FleetError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawFleetConfig =
        serde_json::from_str(&content).map_err(|source| FleetError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    let topics = match required {
        RequiredLists::ReposAndTopics => require_list(path, "topics", raw.topics)?,
        RequiredLists::Repos => raw.topics.unwrap_or_default(),
    };
    let repos = require_list(path, "repos", raw.repos)?;

    Ok(FleetConfig { repos, topics })
}

fn require_list(
    path: &Path,
    field: &'static str,
    value: Option<Vec<String>>,
) -> Result<Vec<String>, FleetError> {
    let Some(items) = value else {
        return Err(FleetError::MissingList {
            path: path.to_path_buf(),
            field,
        });
    };
    if items.is_empty() {
        return Err(FleetError::EmptyList { field });
    }
    Ok(items)
}
