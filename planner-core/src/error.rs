//! Error types for the planner core
//!
//! Store actions never fail; these errors come from the boundaries around the
//! store (snapshot decoding, settings files, parsing user input).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur outside of the store actions
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Unknown requirement mode: '{0}'")]
    InvalidMode(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to determine home directory")]
    NoHomeDir,
}

impl PlannerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlannerError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
