//! Evidence assembly for the decision engine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::github::{ItemSource, Repository};
use crate::models::{Item, Label, LinkedItem};

/// Everything the model sees when choosing labels.
#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    /// The item under classification, with its linked items resolved.
    pub item: Item,
    pub labels: Vec<Label>,
    /// Global instructions from the configuration, if any.
    pub instructions: Option<String>,
    /// Declared context file path to its contents.
    pub context_files: BTreeMap<String, String>,
}

impl Evidence {
    pub fn new(item: Item, labels: Vec<Label>) -> Self {
        Self {
            item,
            labels,
            instructions: None,
            context_files: BTreeMap::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = (!instructions.trim().is_empty()).then_some(instructions);
        self
    }

    pub fn with_context_files(mut self, context_files: BTreeMap<String, String>) -> Self {
        self.context_files = context_files;
        self
    }
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // #N, repo#N and org/repo#N
        Regex::new(r"(?:[\w.-]+/)?[\w.-]*#(\d+)\b").expect("reference pattern is valid")
    })
}

/// Issue and pull request numbers referenced in `text`, de-duplicated and
/// in ascending order.
pub fn extract_references(text: &str) -> Vec<u64> {
    reference_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Resolve the items referenced from `item`'s body.
///
/// A reference that can't be fetched is logged and skipped. The item's own
/// number is never treated as a link.
pub async fn resolve_linked_items(
    source: &dyn ItemSource,
    repo: &Repository,
    item: &Item,
) -> Vec<LinkedItem> {
    let mut linked = Vec::new();
    for number in extract_references(item.body()) {
        if number == item.number() {
            continue;
        }
        match source.fetch_linked_item(repo, number).await {
            Ok(linked_item) => linked.push(linked_item),
            Err(e) => tracing::warn!("Skipping linked item #{}: {}", number, e),
        }
    }
    linked
}

/// Build the evidence bundle handed to the decision engine.
pub async fn assemble(
    source: &dyn ItemSource,
    repo: &Repository,
    item: Item,
    labels: Vec<Label>,
    instructions: &str,
    context_files: BTreeMap<String, String>,
) -> Evidence {
    let linked = resolve_linked_items(source, repo, &item).await;
    tracing::debug!(
        "Assembled evidence for #{}: {} linked items, {} context files",
        item.number(),
        linked.len(),
        context_files.len()
    );

    Evidence::new(item.with_linked_items(linked), labels)
        .with_instructions(instructions)
        .with_context_files(context_files)
}
