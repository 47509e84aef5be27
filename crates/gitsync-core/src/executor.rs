//! Applying converged content to the working copy

use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Outcome of one executor action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Whether the target was modified
    pub changed: bool,
    /// Whether the action failed
    pub failed: bool,
    /// Details of a failure, or other notes from the executor
    pub diagnostic: Option<String>,
}

impl ExecutionReport {
    pub fn changed(changed: bool) -> Self {
        Self {
            changed,
            ..Self::default()
        }
    }

    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            changed: false,
            failed: true,
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// Convert into whether `destination` changed, failing with
    /// [`Error::ConvergenceApplyFailure`] if the action failed.
    pub fn into_result(self, destination: &Path) -> Result<bool> {
        if self.failed {
            return Err(Error::ConvergenceApplyFailure {
                destination: destination.to_path_buf(),
                message: self
                    .diagnostic
                    .unwrap_or_else(|| "executor reported failure".into()),
            });
        }
        Ok(self.changed)
    }
}

/// Carries out copies and writes into the working copy.
pub trait ConvergenceExecutor {
    /// Make `target` an exact copy of `source`: content, structure, permission
    /// bits and symlinks, with extraneous target entries removed.
    fn mirror(&self, source: &Path, target: &Path) -> ExecutionReport;

    /// Write `content` to `target` as a file carrying the permission bits of
    /// `permissions_from`.
    fn write(&self, content: &[u8], permissions_from: &Path, target: &Path) -> ExecutionReport;
}

/// In-process [`ConvergenceExecutor`] built on gitsync-fs.
///
/// Change detection compares content, never timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeExecutor;

impl ConvergenceExecutor for NativeExecutor {
    fn mirror(&self, source: &Path, target: &Path) -> ExecutionReport {
        match gitsync_fs::mirror_tree(source, target, &[]) {
            Ok(changed) => ExecutionReport::changed(changed),
            Err(e) => ExecutionReport::failure(e.to_string()),
        }
    }

    fn write(&self, content: &[u8], permissions_from: &Path, target: &Path) -> ExecutionReport {
        let permissions = match fs::metadata(permissions_from) {
            Ok(metadata) => metadata.permissions(),
            Err(e) => {
                return ExecutionReport::failure(format!("{}: {e}", permissions_from.display()));
            }
        };

        match gitsync_fs::write_file(content, &permissions, target) {
            Ok(changed) => ExecutionReport::changed(changed),
            Err(e) => ExecutionReport::failure(e.to_string()),
        }
    }
}
