//! Label decision engine.
//!
//! One structured call to a language model per run. The model's output
//! space is constrained to the catalog's names through the response schema,
//! and the reply is validated against the catalog again before it is
//! returned, so a [`Decision`] never names a label outside the catalog.

mod openai;
pub mod prompts;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use openai::*;

use crate::context::Evidence;
use crate::models::{name_key, Decision, Label};

/// Errors from the model provider.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model API key not configured (set OPENAI_API_KEY)")]
    NotConfigured,

    #[error("Model request failed: {0}")]
    Request(String),

    #[error("Model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Model refused to answer: {0}")]
    Refusal(String),
}

/// Errors that stop a run from producing a decision.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("Duplicate label in catalog: {0}")]
    DuplicateLabel(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to render evidence: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Malformed model output ({reason}): {raw}")]
    Malformed { reason: String, raw: String },

    #[error("Model chose a label outside the catalog: {0}")]
    UnknownLabel(String),
}

/// A single structured classification request.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub system_prompt: String,
    pub user_message: String,
    /// JSON schema the reply must conform to.
    pub schema: serde_json::Value,
}

/// A language model able to answer a [`ClassificationRequest`] with JSON text.
#[async_trait]
pub trait LabelModel: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ModelError>;
}

/// One chosen label, either bare or with its reasoning.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Choice {
    Detailed {
        name: String,
        #[serde(default)]
        reasoning: Option<String>,
    },
    Name(String),
}

/// Accepted reply shapes: the schema's `{"labels": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply {
    Wrapped { labels: Vec<Choice> },
    Bare(Vec<Choice>),
}

/// Choose the labels that apply to the evidence's item.
///
/// Fails on a catalog with duplicate names (compared case-insensitively), on
/// a provider failure, and on output that can't be mapped onto the catalog.
/// An empty catalog yields an empty decision without calling the model.
pub async fn decide(model: &dyn LabelModel, evidence: &Evidence) -> Result<Decision, DecisionError> {
    let catalog = catalog_index(&evidence.labels)?;
    if catalog.is_empty() {
        tracing::info!("Label catalog is empty, nothing to decide");
        return Ok(Decision::empty());
    }

    let request = ClassificationRequest {
        system_prompt: prompts::system_prompt(evidence.instructions.as_deref()),
        user_message: prompts::user_message(evidence)?,
        schema: prompts::response_schema(&evidence.labels),
    };

    tracing::info!(
        "Asking {} to choose from {} labels for #{}",
        model.name(),
        catalog.len(),
        evidence.item.number()
    );
    let raw = model.classify(&request).await?;
    let decision = parse_decision(&raw, &catalog)?;

    for (label, reason) in &decision.reasoning {
        tracing::debug!("{}: {}", label, reason);
    }
    tracing::info!("Chosen labels: {:?}", decision.labels);

    Ok(decision)
}

/// Map case-insensitive keys to canonical names, rejecting duplicates.
fn catalog_index(labels: &[Label]) -> Result<HashMap<String, &str>, DecisionError> {
    let mut index = HashMap::with_capacity(labels.len());
    for label in labels {
        if index.insert(label.key(), label.name.as_str()).is_some() {
            return Err(DecisionError::DuplicateLabel(label.name.clone()));
        }
    }
    Ok(index)
}

/// Strip a Markdown code fence some models wrap JSON in.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_decision(raw: &str, catalog: &HashMap<String, &str>) -> Result<Decision, DecisionError> {
    let reply: Reply =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| DecisionError::Malformed {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;

    let choices = match reply {
        Reply::Wrapped { labels } | Reply::Bare(labels) => labels,
    };

    let mut decision = Decision::empty();
    let mut seen = HashSet::new();
    for choice in choices {
        let (name, reasoning) = match choice {
            Choice::Detailed { name, reasoning } => (name, reasoning),
            Choice::Name(name) => (name, None),
        };
        let canonical = catalog
            .get(&name_key(name.trim()))
            .ok_or_else(|| DecisionError::UnknownLabel(name.clone()))?;

        if !seen.insert(*canonical) {
            continue;
        }
        decision.labels.push(canonical.to_string());
        if let Some(reason) = reasoning.filter(|r| !r.is_empty()) {
            decision.reasoning.insert(canonical.to_string(), reason);
        }
    }

    Ok(decision)
}
