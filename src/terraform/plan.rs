//! Structured plan inspection and the destroy guard.
//!
//! The plan JSON comes from `terraform show -json <planfile>`; only the
//! `resource_changes` array matters here.

use serde::Deserialize;

use crate::error::RunResult;

/// A computed execution plan
#[derive(Debug, Default, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

/// One planned change
#[derive(Debug, Deserialize)]
pub struct ResourceChange {
    pub address: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    pub change: Change,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub actions: Vec<String>,
}

impl Plan {
    pub fn from_json(raw: &str) -> RunResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// True when any planned change performs real work (anything beyond
    /// no-op and read)
    pub fn has_changes(&self) -> bool {
        self.resource_changes.iter().any(|change| {
            change
                .change
                .actions
                .iter()
                .any(|action| action != "no-op" && action != "read")
        })
    }

    /// True iff any planned change for `resource_type` includes a delete
    /// action. Replacements count: their action set is `[delete, create]`.
    pub fn will_destroy(&self, resource_type: &str) -> bool {
        self.resource_changes.iter().any(|change| {
            change.resource_type == resource_type
                && change.change.actions.iter().any(|action| action == "delete")
        })
    }

    /// Addresses of planned deletions for `resource_type`
    pub fn destroyed_addresses(&self, resource_type: &str) -> Vec<&str> {
        self.resource_changes
            .iter()
            .filter(|change| {
                change.resource_type == resource_type
                    && change.change.actions.iter().any(|action| action == "delete")
            })
            .map(|change| change.address.as_str())
            .collect()
    }

    /// (add, change, destroy) counts for display
    pub fn summary(&self) -> (usize, usize, usize) {
        let mut add = 0;
        let mut update = 0;
        let mut destroy = 0;

        for change in &self.resource_changes {
            for action in &change.change.actions {
                match action.as_str() {
                    "create" => add += 1,
                    "update" => update += 1,
                    "delete" => destroy += 1,
                    _ => {}
                }
            }
        }

        (add, update, destroy)
    }
}
