//! Top-level error for a labeling run.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::decision::DecisionError;
use crate::github::ClientError;

/// Any error that terminates a run. No labels are applied after one of these
/// is raised before the apply step.
#[derive(Debug, Error)]
pub enum LabelerError {
    #[error("Repository not set (expected owner/name in GITHUB_REPOSITORY)")]
    MissingRepository,

    #[error("{0}")]
    InvalidRepository(String),

    #[error("Could not find PR/Issue number: pass --event-number or set GITHUB_EVENT_PATH")]
    MissingEventNumber,

    #[error("Failed to read event file {path}: {reason}")]
    Event { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("GitHub API error: {0}")]
    GitHub(#[from] ClientError),

    #[error("Label decision failed: {0}")]
    Decision(#[from] DecisionError),

    #[error("Failed to write output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
