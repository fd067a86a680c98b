use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The labels chosen for an item.
///
/// `labels` is semantically a set: no duplicates, every name taken from the
/// catalog in its canonical spelling. `reasoning` maps a chosen label to the
/// model's explanation, for audit only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub labels: Vec<String>,
    #[serde(default)]
    pub reasoning: BTreeMap<String, String>,
}

impl Decision {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}
