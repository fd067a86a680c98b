use serde::{Deserialize, Serialize};

/// A label in the catalog for one run.
///
/// Labels come either from the repository's live label list or from the
/// configuration document. When both define the same name (matched
/// case-insensitively) the configuration's `description` and `instructions`
/// win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// What the label means.
    #[serde(default)]
    pub description: Option<String>,
    /// When the label should or should not be applied. Takes precedence over
    /// the description when the two disagree.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instructions: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Case-insensitive key used for every name comparison.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// Normalize a label name for case-insensitive matching.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}
