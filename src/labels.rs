//! Label catalog reconciliation.
//!
//! Builds the catalog for a run by merging the repository's labels with the
//! labels declared in configuration. All name comparisons are
//! case-insensitive, matching how GitHub itself treats label names.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::config::{Config, LabelConfig};
use crate::github::{ClientError, CreateLabelInput, LabelSource, Repository, DEFAULT_LABEL_COLOR};
use crate::models::{name_key, Label};

/// Per-process memo of repository label lists.
///
/// Only a convenience for avoiding repeated fetches inside one run. Call
/// [`LabelCache::clear`] between logically distinct runs.
#[derive(Debug, Default)]
pub struct LabelCache {
    entries: Mutex<HashMap<Repository, Vec<Label>>>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, repo: &Repository) -> Option<Vec<Label>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(repo)
            .cloned()
    }

    pub fn insert(&self, repo: &Repository, labels: Vec<Label>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(repo.clone(), labels);
    }

    /// Record a label created during the run so later reads see it.
    fn push(&self, repo: &Repository, label: Label) {
        if let Some(labels) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(repo)
        {
            labels.push(label);
        }
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Resolves the label catalog for a repository.
pub struct LabelRegistry<'a> {
    source: &'a dyn LabelSource,
    cache: &'a LabelCache,
}

impl<'a> LabelRegistry<'a> {
    pub fn new(source: &'a dyn LabelSource, cache: &'a LabelCache) -> Self {
        Self { source, cache }
    }

    /// The repository's current labels, fetched at most once per cache lifetime.
    pub async fn repo_labels(&self, repo: &Repository) -> Result<Vec<Label>, ClientError> {
        if let Some(labels) = self.cache.get(repo) {
            tracing::debug!("Using cached labels for {}", repo);
            return Ok(labels);
        }

        let labels = self.source.list_labels(repo).await?;
        tracing::debug!("Fetched {} labels for {}", labels.len(), repo);
        self.cache.insert(repo, labels.clone());
        Ok(labels)
    }

    /// Fetch the repository labels and reconcile them with `config`.
    pub async fn catalog(
        &self,
        repo: &Repository,
        config: &Config,
        include_repo_labels: bool,
    ) -> Result<Vec<Label>, ClientError> {
        let existing = self.repo_labels(repo).await?;
        Ok(self
            .reconcile(repo, existing, config, include_repo_labels)
            .await)
    }

    /// Merge `existing` repository labels with the labels declared in `config`.
    ///
    /// Config labels missing from the repository are created there and
    /// appended to the catalog even when creation fails. With
    /// `include_repo_labels` false, only config-declared names survive. Config
    /// descriptions and instructions are overlaid onto matching labels.
    ///
    /// Repository labels keep their order; created labels follow in
    /// declaration order.
    pub async fn reconcile(
        &self,
        repo: &Repository,
        existing: Vec<Label>,
        config: &Config,
        include_repo_labels: bool,
    ) -> Vec<Label> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut labels: Vec<Label> = existing
            .into_iter()
            .filter(|l| seen.insert(l.key()))
            .collect();

        for cfg in &config.labels {
            if !seen.insert(name_key(&cfg.name)) {
                continue;
            }

            tracing::info!(
                "Label {} was not found on the repository, creating...",
                cfg.name
            );
            let input = CreateLabelInput {
                name: cfg.name.clone(),
                description: cfg.description.clone().unwrap_or_default(),
                color: DEFAULT_LABEL_COLOR.to_string(),
            };
            match self.source.create_label(repo, &input).await {
                Ok(()) => self.cache.push(repo, repo_label(cfg)),
                Err(e) if e.is_already_exists() => {
                    tracing::debug!("Label {} already exists", cfg.name);
                }
                Err(e) => tracing::warn!("Failed to create label {}: {}", cfg.name, e),
            }

            labels.push(Label {
                name: cfg.name.clone(),
                description: cfg.description.clone(),
                instructions: cfg.instructions.clone(),
            });
        }

        if !include_repo_labels {
            let config_names: HashSet<String> =
                config.labels.iter().map(|c| name_key(&c.name)).collect();
            labels.retain(|l| config_names.contains(&l.key()));
        }

        // First declaration wins when a name is repeated
        let mut config_map: HashMap<String, &LabelConfig> = HashMap::new();
        for cfg in &config.labels {
            config_map.entry(name_key(&cfg.name)).or_insert(cfg);
        }

        labels
            .into_iter()
            .map(|label| match config_map.get(&label.key()) {
                Some(cfg) => Label {
                    description: cfg
                        .description
                        .clone()
                        .filter(|d| !d.is_empty())
                        .or(label.description),
                    instructions: cfg.instructions.clone(),
                    name: label.name,
                },
                None => label,
            })
            .collect()
    }
}

/// The label as GitHub will report it after creation.
fn repo_label(cfg: &LabelConfig) -> Label {
    Label {
        name: cfg.name.clone(),
        description: cfg.description.clone(),
        instructions: None,
    }
}
