//! Prompt text and evidence rendering for the labeling call.

use serde_json::json;

use crate::context::Evidence;
use crate::models::Label;

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Name of the structured-output schema sent to the model.
pub const SCHEMA_NAME: &str = "label_decision";

const LABELER_INSTRUCTIONS: &str = r###"You are an expert at categorizing GitHub issues and pull requests.

Be conservative - only assign labels when you're confident they apply. When
there is no clear signal for a label, leave it out. Assigning no labels at all
is a perfectly good answer.

Evaluate every available label independently. Any number of labels may apply.

Each label has a description that explains what the label means. A label may
also have instructions that explain when it should or should not be applied.
Instructions always take precedence over how well the content matches the
description: if a label's instructions say it must not be applied
automatically, never choose it, no matter how relevant it looks.

Your context includes the issue or pull request (title, body, author and, for
pull requests, the changed files with their diffs), any issues or pull requests
it links to, all available labels with their descriptions and instructions,
and any other files from the repository that may be relevant to your task."###;

const TASK: &str = r###"Analyze the PR/issue carefully and assign appropriate labels from the
available set. You may assign any number of labels, including no labels. Do
your best to assign labels based on what would be most helpful to the repo
maintainers, taking the label descriptions into account as well as any
additional instructions. For every label you assign, give a one-sentence
reason."###;

/// System prompt for the labeler, with the global instructions applied to
/// every label's evaluation.
pub fn system_prompt(instructions: Option<&str>) -> String {
    format!(
        "{LABELER_INSTRUCTIONS}\n\nAdditional instructions (apply them when evaluating every label):\n\n{}",
        instructions.unwrap_or("None.")
    )
}

/// User message carrying the task and all evidence.
pub fn user_message(evidence: &Evidence) -> Result<String, serde_json::Error> {
    let mut message = String::from(TASK);

    message.push_str("\n\n<pr_or_issue>\n");
    message.push_str(&serde_json::to_string_pretty(&evidence.item)?);
    message.push_str("\n</pr_or_issue>\n\n<all_labels>\n");
    message.push_str(&serde_json::to_string_pretty(&evidence.labels)?);
    message.push_str("\n</all_labels>\n");

    if !evidence.context_files.is_empty() {
        message.push_str("\n<context_files>\n");
        for (path, content) in &evidence.context_files {
            message.push_str(&format!("=== {} ===\n{}\n", path, content));
        }
        message.push_str("</context_files>\n");
    }

    Ok(message)
}

/// JSON schema restricting the answer to the catalog's label names.
///
/// Built per call because the vocabulary is only known at run time.
pub fn response_schema(labels: &[Label]) -> serde_json::Value {
    let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "labels": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "enum": names },
                        "reasoning": { "type": "string" }
                    },
                    "required": ["name", "reasoning"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["labels"],
        "additionalProperties": false
    })
}
