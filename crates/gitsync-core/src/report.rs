//! Serializable summary of a run

use serde::{Deserialize, Serialize};

use crate::model::SynchronizationResult;

/// Destinations changed by a run, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synchronised {
    pub files: Vec<String>,
    pub templates: Vec<String>,
    pub subrepos: Vec<String>,
}

/// Report from a reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Whether anything in the repository changed
    pub changed: bool,
    pub synchronised: Synchronised,
}

impl SyncReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&SynchronizationResult> for SyncReport {
    fn from(result: &SynchronizationResult) -> Self {
        Self {
            changed: result.changed(),
            synchronised: Synchronised {
                files: result.files().iter().map(|r| r.destination.to_string()).collect(),
                templates: result
                    .templates()
                    .iter()
                    .map(|r| r.destination.to_string())
                    .collect(),
                subrepos: result
                    .subrepos()
                    .iter()
                    .map(|r| r.checkout.directory.to_string())
                    .collect(),
            },
        }
    }
}
