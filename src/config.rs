//! Label policy configuration.
//!
//! The policy document is YAML:
//!
//! ```yaml
//! instructions: Only apply bug labels with a reproduction case.
//! include_repo_labels: true
//! labels:
//!   - good first issue
//!   - bug:
//!       description: Something isn't working
//!       instructions: Only apply when reproduction steps are given.
//! context-files:
//!   - CONTRIBUTING.md
//! ```
//!
//! A missing file is not an error: the defaults are used instead.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

/// Configuration errors. A missing file is never one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),

    #[error("Invalid label entry #{index}: {reason}")]
    InvalidLabel { index: usize, reason: String },

    /// A [`ConfigError::Syntax`] or [`ConfigError::InvalidLabel`] found while loading `path`.
    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Policy for a single label, as declared in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
}

impl LabelConfig {
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
}

/// The parsed label policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Global guidance applied to every label's evaluation.
    pub instructions: String,
    /// When false, only labels declared in `labels` are eligible.
    pub include_repo_labels: bool,
    pub labels: Vec<LabelConfig>,
    /// Repository-relative paths handed to the model as extra evidence.
    pub context_files: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instructions: String::new(),
            include_repo_labels: true,
            labels: Vec::new(),
            context_files: Vec::new(),
        }
    }
}

/// Top-level document shape before label entries are normalized.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    include_repo_labels: Option<bool>,
    #[serde(default)]
    labels: Option<Vec<Value>>,
    #[serde(default, rename = "context-files")]
    context_files_dashed: Option<Vec<String>>,
    #[serde(default)]
    context_files: Option<Vec<String>>,
}

/// Properties block of a `- name: {...}` label entry.
#[derive(Debug, Default, Deserialize)]
struct LabelProps {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
}

/// The two accepted label entry shapes.
enum LabelEntry {
    Bare(String),
    WithProps(String, LabelProps),
}

impl LabelEntry {
    fn parse(index: usize, value: Value) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidLabel { index, reason };

        match value {
            Value::String(name) => Ok(Self::Bare(name)),
            Value::Mapping(mapping) => {
                if mapping.len() != 1 {
                    return Err(invalid(format!(
                        "expected a single label name as key, found {} keys",
                        mapping.len()
                    )));
                }
                let Some((key, props)) = mapping.into_iter().next() else {
                    return Err(invalid("empty mapping".to_string()));
                };
                let Value::String(name) = key else {
                    return Err(invalid("label name must be a string".to_string()));
                };
                let props = match props {
                    Value::Null => LabelProps::default(),
                    Value::Mapping(_) => serde_yaml::from_value(props)
                        .map_err(|e| invalid(format!("label '{}': {}", name, e)))?,
                    _ => {
                        return Err(invalid(format!(
                            "properties of label '{}' must be a mapping",
                            name
                        )))
                    }
                };
                Ok(Self::WithProps(name, props))
            }
            _ => Err(invalid(
                "expected a label name or a `name: {description, instructions}` mapping"
                    .to_string(),
            )),
        }
    }

    fn into_config(self, index: usize) -> Result<LabelConfig, ConfigError> {
        let config = match self {
            Self::Bare(name) => LabelConfig::new(name),
            Self::WithProps(name, props) => LabelConfig {
                name,
                description: props.description,
                instructions: props.instructions,
            },
        };
        if config.name.trim().is_empty() {
            return Err(ConfigError::InvalidLabel {
                index,
                reason: "label name must not be empty".to_string(),
            });
        }
        Ok(config)
    }
}

impl Config {
    /// Load configuration from a YAML file.
    /// Returns the default config if the file doesn't exist or is empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }

    /// Parse a configuration document from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(content).map_err(ConfigError::Syntax)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_yaml::from_value(value).map_err(ConfigError::Syntax)?;

        let labels = raw
            .labels
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, value)| LabelEntry::parse(index, value)?.into_config(index))
            .collect::<Result<Vec<_>, _>>()?;

        // `context-files` takes precedence over the older `context_files`
        let context_files = raw
            .context_files_dashed
            .or(raw.context_files)
            .unwrap_or_default();

        Ok(Self {
            instructions: raw.instructions.unwrap_or_default(),
            include_repo_labels: raw.include_repo_labels.unwrap_or(true),
            labels,
            context_files,
        })
    }

    /// Load the contents of the declared context files.
    ///
    /// Paths are resolved against `root`; the returned map is keyed by the
    /// path as declared. Files that can't be read are skipped with a warning.
    pub fn load_context_files(&self, root: impl AsRef<Path>) -> BTreeMap<String, String> {
        let root = root.as_ref();
        let mut context = BTreeMap::new();

        for file_path in &self.context_files {
            let full_path = root.join(file_path);
            match std::fs::read_to_string(&full_path) {
                Ok(content) => {
                    context.insert(file_path.clone(), content);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!("Context file {} not found", file_path);
                }
                Err(e) => {
                    tracing::warn!("Failed to read context file {}: {}", file_path, e);
                }
            }
        }

        context
    }
}
