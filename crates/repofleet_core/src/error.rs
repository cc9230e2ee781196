use std::path::PathBuf;

use thiserror::Error;

/// Conditions that stop a run before any operation is attempted.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("'{binary}' CLI not found. Install it: https://cli.github.com")]
    GhNotFound { binary: String },

    #[error("'{binary}' CLI not authenticated. Run: gh auth login")]
    GhNotAuthenticated { binary: String },

    #[error("failed to read {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config {} has no `{field}` list", path.display())]
    MissingList { path: PathBuf, field: &'static str },

    #[error("No {field} defined in config.")]
    EmptyList { field: &'static str },
}
