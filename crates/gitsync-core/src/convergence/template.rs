use std::fs;

use gitsync_fs::TreeSnapshot;
use gitsync_fs::io::permission_bits;
use gitsync_git::WorkingCopy;

use super::{Convergence, Outcome, check_source, exists};
use crate::executor::ConvergenceExecutor;
use crate::model::TemplateResource;
use crate::render::TemplateRenderer;
use crate::safety::validate_destination;
use crate::{Error, Result};

/// Converges files rendered from templates.
///
/// The rendered file carries the template file's permission bits.
pub struct TemplateConvergence<'a> {
    renderer: &'a dyn TemplateRenderer,
    executor: &'a dyn ConvergenceExecutor,
}

impl<'a> TemplateConvergence<'a> {
    pub fn new(renderer: &'a dyn TemplateRenderer, executor: &'a dyn ConvergenceExecutor) -> Self {
        Self { renderer, executor }
    }
}

impl Convergence for TemplateConvergence<'_> {
    type Resource = TemplateResource;

    fn converge(&self, resource: &TemplateResource, working_copy: &mut dyn WorkingCopy) -> Result<Outcome> {
        check_source(&resource.source)?;
        let metadata = fs::metadata(&resource.source)?;
        if !metadata.is_file() {
            return Err(Error::configuration(format!(
                "template must be a file: {}",
                resource.source.display()
            )));
        }

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

        let rendered = self.renderer.render(&resource.source, &resource.variables)?;
        let desired = TreeSnapshot::of_content(&rendered, permission_bits(&metadata)).as_committed();
        let current = TreeSnapshot::capture(&target)?.map(|snapshot| snapshot.as_committed());
        if Some(desired) == current {
            tracing::debug!(destination = %resource.destination, "Already synchronised");
            return Ok(Outcome::Unchanged);
        }

        let changed = self
            .executor
            .write(&rendered, &resource.source, &target)
            .into_result(&target)?;
        if changed {
            tracing::info!(
                source = %resource.source.display(),
                destination = %resource.destination,
                "Synchronised template"
            );
            Ok(Outcome::Applied)
        } else {
            Ok(Outcome::Unchanged)
        }
    }
}
