//! Applies chosen labels to the item.

use std::fmt;

use crate::github::{ClientError, LabelSource, Repository};

/// What [`apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub number: u64,
    pub labels: Vec<String>,
    pub dry_run: bool,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(
                f,
                "Dry run: would apply labels {:?} to #{}",
                self.labels, self.number
            )
        } else {
            write!(f, "Applied labels {:?} to #{}", self.labels, self.number)
        }
    }
}

/// Attach `names` to issue or pull request `number`.
///
/// In dry-run mode the labels are only printed. Otherwise the label source is
/// called once with every name; labels already on the item are not an error.
pub async fn apply(
    source: &dyn LabelSource,
    repo: &Repository,
    number: u64,
    names: &[String],
    dry_run: bool,
) -> Result<ApplyOutcome, ClientError> {
    let outcome = ApplyOutcome {
        number,
        labels: names.to_vec(),
        dry_run,
    };

    if dry_run {
        println!("{}", outcome);
        return Ok(outcome);
    }

    if names.is_empty() {
        tracing::info!("No labels to apply to #{}", number);
        return Ok(outcome);
    }

    match source.add_labels(repo, number, names).await {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => {
            tracing::debug!("Labels already present on #{}: {}", number, e);
        }
        Err(e) => return Err(e),
    }
    tracing::info!("{}", outcome);
    Ok(outcome)
}
