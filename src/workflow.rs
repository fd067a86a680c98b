//! The labeling run: config → catalog → evidence → decision → apply.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::apply::apply;
use crate::config::Config;
use crate::context::assemble;
use crate::decision::{decide, LabelModel};
use crate::error::LabelerError;
use crate::github::{ItemSource, LabelSource, Repository};
use crate::labels::{LabelCache, LabelRegistry};

/// Options for one labeling run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repository in `owner/name` form.
    pub repository: Option<String>,
    /// Issue or pull request number. Falls back to the event file.
    pub event_number: Option<u64>,
    /// GitHub event payload (`GITHUB_EVENT_PATH`).
    pub event_path: Option<PathBuf>,
    pub config_path: PathBuf,
    /// Root that context file paths are resolved against.
    pub workspace_root: PathBuf,
    pub dry_run: bool,
    /// File to append a `labels=[...]` line to (`GITHUB_OUTPUT`).
    pub output_sink: Option<PathBuf>,
    /// Overrides `include_repo_labels` from the config document.
    pub include_repo_labels: Option<bool>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repository: None,
            event_number: None,
            event_path: None,
            config_path: PathBuf::from(".github/ai-labeler.yml"),
            workspace_root: PathBuf::from("."),
            dry_run: false,
            output_sink: None,
            include_repo_labels: None,
        }
    }
}

/// The collaborators a run talks to.
pub struct Labeler<'a> {
    items: &'a dyn ItemSource,
    labels: &'a dyn LabelSource,
    model: &'a dyn LabelModel,
    cache: &'a LabelCache,
}

impl<'a> Labeler<'a> {
    pub fn new(
        items: &'a dyn ItemSource,
        labels: &'a dyn LabelSource,
        model: &'a dyn LabelModel,
        cache: &'a LabelCache,
    ) -> Self {
        Self {
            items,
            labels,
            model,
            cache,
        }
    }

    /// Label one issue or pull request and return the chosen labels.
    pub async fn run(&self, run: &RunConfig) -> Result<Vec<String>, LabelerError> {
        // Resolve the target before touching the network
        let repo = resolve_repository(run.repository.as_deref())?;
        let number = resolve_event_number(run.event_number, run.event_path.as_deref())?;
        tracing::info!("Labeling {}#{}", repo, number);

        let config = Config::load(&run.config_path)?;
        let include_repo_labels = run
            .include_repo_labels
            .unwrap_or(config.include_repo_labels);

        let item = self.items.fetch_item(&repo, number).await?;

        let registry = LabelRegistry::new(self.labels, self.cache);
        let catalog = registry
            .catalog(&repo, &config, include_repo_labels)
            .await?;
        tracing::info!("Label catalog has {} labels", catalog.len());

        let context_files = config.load_context_files(&run.workspace_root);
        let evidence = assemble(
            self.items,
            &repo,
            item,
            catalog,
            &config.instructions,
            context_files,
        )
        .await;

        let decision = decide(self.model, &evidence).await?;

        apply(self.labels, &repo, number, &decision.labels, run.dry_run).await?;

        if let Some(ref path) = run.output_sink {
            write_output(path, &decision.labels)?;
        }

        Ok(decision.labels)
    }
}

fn resolve_repository(repository: Option<&str>) -> Result<Repository, LabelerError> {
    let repository = repository
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(LabelerError::MissingRepository)?;
    repository.parse().map_err(LabelerError::InvalidRepository)
}

#[derive(Debug, Default, Deserialize)]
struct EventRef {
    number: Option<u64>,
}

/// The subset of a GitHub event payload that identifies the item.
#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    number: Option<u64>,
    #[serde(default)]
    pull_request: Option<EventRef>,
    #[serde(default)]
    issue: Option<EventRef>,
}

/// The issue or pull request number: explicit input first, then the event
/// payload's `number`, `pull_request.number` or `issue.number`.
pub fn resolve_event_number(
    explicit: Option<u64>,
    event_path: Option<&Path>,
) -> Result<u64, LabelerError> {
    if let Some(number) = explicit {
        return Ok(number);
    }

    let Some(path) = event_path else {
        return Err(LabelerError::MissingEventNumber);
    };
    let event_err = |reason: String| LabelerError::Event {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| event_err(e.to_string()))?;
    let event: EventPayload =
        serde_json::from_str(&content).map_err(|e| event_err(e.to_string()))?;

    event
        .number
        .or(event.pull_request.and_then(|p| p.number))
        .or(event.issue.and_then(|i| i.number))
        .ok_or(LabelerError::MissingEventNumber)
}

/// Append the chosen labels as a `labels=[...]` line.
pub fn write_output(path: &Path, labels: &[String]) -> Result<(), LabelerError> {
    let output_err = |source: std::io::Error| LabelerError::Output {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string(labels)
        .map_err(|e| output_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(output_err)?;
    writeln!(file, "labels={}", json).map_err(output_err)
}
