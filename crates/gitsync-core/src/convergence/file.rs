use std::path::Path;

use gitsync_fs::TreeSnapshot;
use gitsync_git::WorkingCopy;

use super::{Convergence, Outcome, check_source, exists};
use crate::executor::ConvergenceExecutor;
use crate::model::FileResource;
use crate::safety::validate_destination;
use crate::Result;

/// Converges files and directories copied verbatim.
pub struct FileConvergence<'a> {
    executor: &'a dyn ConvergenceExecutor,
}

impl<'a> FileConvergence<'a> {
    pub fn new(executor: &'a dyn ConvergenceExecutor) -> Self {
        Self { executor }
    }
}

impl Convergence for FileConvergence<'_> {
    type Resource = FileResource;

    fn converge(&self, resource: &FileResource, working_copy: &mut dyn WorkingCopy) -> Result<Outcome> {
        check_source(&resource.source)?;
        let root = working_copy.root()?.to_path_buf();
        let target = validate_destination(&resource.destination, &root)?;

        if exists(&target) && !resource.overwrite {
            tracing::info!(
                source = %resource.source.display(),
                destination = %resource.destination,
                "Destination exists and overwrite is disabled, skipping"
            );
            return Ok(Outcome::Skipped);
        }

        if committed(&resource.source)? == committed(&target)? {
            tracing::debug!(destination = %resource.destination, "Already synchronised");
            return Ok(Outcome::Unchanged);
        }

        let changed = self
            .executor
            .mirror(&resource.source, &target)
            .into_result(&target)?;
        if changed {
            tracing::info!(
                source = %resource.source.display(),
                destination = %resource.destination,
                "Synchronised file"
            );
            Ok(Outcome::Applied)
        } else {
            Ok(Outcome::Unchanged)
        }
    }
}

/// What a commit of the tree at `path` would hold; nothing for a missing path.
fn committed(path: &Path) -> Result<TreeSnapshot> {
    Ok(TreeSnapshot::capture(path)?
        .map(|snapshot| snapshot.as_committed())
        .unwrap_or_default())
}
