use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The issue or pull request being labeled.
///
/// Constructed once per run from the live GitHub object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Issue {
        number: u64,
        title: String,
        body: String,
        author: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        linked_items: Vec<LinkedItem>,
    },
    PullRequest {
        number: u64,
        title: String,
        body: String,
        /// Changed file path to its patch (or content) snippet.
        files: BTreeMap<String, String>,
        author: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        linked_items: Vec<LinkedItem>,
    },
}

impl Item {
    pub fn number(&self) -> u64 {
        match self {
            Self::Issue { number, .. } | Self::PullRequest { number, .. } => *number,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Issue { title, .. } | Self::PullRequest { title, .. } => title,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Issue { body, .. } | Self::PullRequest { body, .. } => body,
        }
    }

    pub fn author(&self) -> &str {
        match self {
            Self::Issue { author, .. } | Self::PullRequest { author, .. } => author,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Issue { .. } => ItemKind::Issue,
            Self::PullRequest { .. } => ItemKind::PullRequest,
        }
    }

    pub fn linked_items(&self) -> &[LinkedItem] {
        match self {
            Self::Issue { linked_items, .. } | Self::PullRequest { linked_items, .. } => {
                linked_items
            }
        }
    }

    /// Replace the linked items, consuming the item.
    pub fn with_linked_items(mut self, items: Vec<LinkedItem>) -> Self {
        match &mut self {
            Self::Issue { linked_items, .. } | Self::PullRequest { linked_items, .. } => {
                *linked_items = items;
            }
        }
        self
    }
}

/// Whether a number refers to an issue or a pull request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
        }
    }
}

/// An issue or pull request referenced from another item's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedItem {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}
