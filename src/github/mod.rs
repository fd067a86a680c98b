//! GitHub collaborators consumed by the labeling pipeline.
//!
//! The pipeline only talks to GitHub through [`ItemSource`] and
//! [`LabelSource`], so tests can swap in fakes. [`GitHubClient`] is the REST
//! implementation of both.

mod client;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::*;

use crate::models::{Item, Label, LinkedItem};

/// Colour used for labels created from configuration.
pub const DEFAULT_LABEL_COLOR: &str = "ededed";

/// A repository identifier in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(format!("Invalid repository '{}': expected owner/name", s)),
        }
    }
}

/// Input for creating a repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLabelInput {
    pub name: String,
    pub description: String,
    pub color: String,
}

/// Source of the item under classification and the items it references.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch an issue or pull request. Pull requests include their changed files.
    async fn fetch_item(&self, repo: &Repository, number: u64) -> Result<Item, ClientError>;

    /// Fetch a summary of a referenced issue or pull request.
    async fn fetch_linked_item(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<LinkedItem, ClientError>;
}

/// Repository label listing and mutation.
#[async_trait]
pub trait LabelSource: Send + Sync {
    /// All labels currently defined on the repository.
    async fn list_labels(&self, repo: &Repository) -> Result<Vec<Label>, ClientError>;

    /// Create a label. Implementations report an existing label as
    /// [`ClientError::AlreadyExists`].
    async fn create_label(
        &self,
        repo: &Repository,
        input: &CreateLabelInput,
    ) -> Result<(), ClientError>;

    /// Attach labels to an issue or pull request. Additive.
    async fn add_labels(
        &self,
        repo: &Repository,
        number: u64,
        names: &[String],
    ) -> Result<(), ClientError>;
}
