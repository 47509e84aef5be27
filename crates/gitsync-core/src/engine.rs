//! ReconciliationEngine implementation
//!
//! The engine checks out the managed repository, converges every configured
//! resource kind in turn, commits and pushes what changed, and always tears
//! the checkout down again.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use gitsync_fs::NormalizedPath;
use gitsync_git::{EmbeddedSubrepoStore, GitRemote, RemoteAuth, RemoteInspector, SubrepoStore, WorkingCopy};

use crate::Result;
use crate::convergence::{
    Convergence, FileConvergence, Outcome, SubrepoConvergence, TemplateConvergence,
};
use crate::executor::{ConvergenceExecutor, NativeExecutor};
use crate::model::{DesiredResource, ResourceKind, SyncConfiguration, SynchronizationResult};
use crate::render::{JinjaRenderer, TemplateRenderer};

/// How changed resources are grouped into commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitGranularity {
    /// One commit per resource kind, covering that kind's changed destinations
    #[default]
    PerKind,
    /// One commit per changed resource
    PerResource,
}

/// Options for a reconciliation run
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, converge and commit locally but never push.
    pub dry_run: bool,
    pub granularity: CommitGranularity,
    /// Directory to create the checkout in, instead of the system temp dir.
    pub checkout_parent: Option<PathBuf>,
}

/// Checked-out working copy that is torn down when dropped.
///
/// [`release`](Self::release) tears down explicitly and reports failure;
/// dropping without releasing (an early return or a panic) tears down on a
/// best-effort basis and logs failure.
struct CheckoutScope<'a> {
    working_copy: &'a mut dyn WorkingCopy,
    released: bool,
}

impl<'a> CheckoutScope<'a> {
    fn acquire(working_copy: &'a mut dyn WorkingCopy, parent: Option<&Path>) -> Result<Self> {
        let root = working_copy.checkout(parent)?;
        tracing::debug!(root = %root.display(), "Working copy checked out");
        Ok(Self {
            working_copy,
            released: false,
        })
    }

    fn release(mut self) -> Result<()> {
        self.released = true;
        Ok(self.working_copy.teardown()?)
    }
}

impl<'a> Deref for CheckoutScope<'a> {
    type Target = dyn WorkingCopy + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.working_copy
    }
}

impl DerefMut for CheckoutScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.working_copy
    }
}

impl Drop for CheckoutScope<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.working_copy.teardown()
        {
            tracing::warn!(error = %e, "Failed to tear down working copy");
        }
    }
}

/// Engine reconciling a repository with a [`SyncConfiguration`].
///
/// Collaborators are injected, so the same engine drives real git remotes or
/// in-memory fakes.
pub struct ReconciliationEngine {
    executor: Box<dyn ConvergenceExecutor>,
    renderer: Box<dyn TemplateRenderer>,
    subrepos: Box<dyn SubrepoStore>,
    remote: Box<dyn RemoteInspector>,
}

impl ReconciliationEngine {
    pub fn new(
        executor: Box<dyn ConvergenceExecutor>,
        renderer: Box<dyn TemplateRenderer>,
        subrepos: Box<dyn SubrepoStore>,
        remote: Box<dyn RemoteInspector>,
    ) -> Self {
        Self {
            executor,
            renderer,
            subrepos,
            remote,
        }
    }

    /// Engine using the in-process executor, the Jinja renderer and the
    /// git-backed subrepo store and remote inspector.
    pub fn with_git(auth: RemoteAuth) -> Self {
        Self::new(
            Box::new(NativeExecutor),
            Box::new(JinjaRenderer::new()),
            Box::new(EmbeddedSubrepoStore::new(auth.clone())),
            Box::new(GitRemote::new(auth)),
        )
    }

    /// Run one reconciliation.
    ///
    /// Kinds are processed subrepos, then files, then templates. Each kind's
    /// changes are committed and, unless this is a dry run, pushed before the
    /// next kind starts. The working copy is torn down on every exit path.
    ///
    /// # Errors
    ///
    /// The first error aborts the run. Changes already pushed stay pushed;
    /// the failing kind is neither committed nor pushed.
    pub fn run(
        &self,
        working_copy: &mut dyn WorkingCopy,
        config: &SyncConfiguration,
        options: &SyncOptions,
    ) -> Result<SynchronizationResult> {
        let span = tracing::info_span!("sync", dry_run = options.dry_run, resources = config.len());
        let _enter = span.enter();

        let mut scope = CheckoutScope::acquire(working_copy, options.checkout_parent.as_deref())?;
        let outcome = self.converge_all(&mut *scope, config, options);
        let released = scope.release();

        let result = outcome?;
        released?;

        tracing::info!(changed = result.total_count(), "Synchronisation complete");
        Ok(result)
    }

    fn converge_all(
        &self,
        working_copy: &mut dyn WorkingCopy,
        config: &SyncConfiguration,
        options: &SyncOptions,
    ) -> Result<SynchronizationResult> {
        let mut result = SynchronizationResult::new();

        for kind in ResourceKind::ORDER {
            let changed = self.converge_kind(working_copy, kind, config, options)?;
            if changed.is_empty() {
                continue;
            }

            if options.granularity == CommitGranularity::PerKind {
                let paths: Vec<NormalizedPath> =
                    changed.iter().map(|r| r.destination().clone()).collect();
                let message = format!("Synchronised {} {}.", changed.len(), kind.plural());
                if !working_copy.commit(&message, Some(paths.as_slice()))? {
                    tracing::debug!(kind = %kind, "Nothing to commit");
                    continue;
                }
            }

            if options.dry_run {
                tracing::info!(kind = %kind, "Dry run, not pushing");
            } else {
                working_copy.push()?;
            }

            for resource in changed {
                result.record(resource);
            }
        }

        Ok(result)
    }

    fn converge_kind(
        &self,
        working_copy: &mut dyn WorkingCopy,
        kind: ResourceKind,
        config: &SyncConfiguration,
        options: &SyncOptions,
    ) -> Result<Vec<DesiredResource>> {
        let files = FileConvergence::new(self.executor.as_ref());
        let templates = TemplateConvergence::new(self.renderer.as_ref(), self.executor.as_ref());
        let subrepos = SubrepoConvergence::new(self.subrepos.as_ref(), self.remote.as_ref());

        let mut changed = Vec::new();
        for resource in config.resources(kind) {
            let span = tracing::debug_span!("resource", kind = %kind, destination = %resource.destination());
            let _enter = span.enter();

            let outcome = match &resource {
                DesiredResource::File(r) => files.converge(r, working_copy)?,
                DesiredResource::Template(r) => templates.converge(r, working_copy)?,
                DesiredResource::Subrepo(r) => subrepos.converge(r, working_copy)?,
            };
            if outcome != Outcome::Applied {
                continue;
            }

            if options.granularity == CommitGranularity::PerResource
                && !working_copy.commit(
                    &resource.commit_message(),
                    Some(std::slice::from_ref(resource.destination())),
                )?
            {
                tracing::debug!(destination = %resource.destination(), "Nothing to commit");
                continue;
            }
            changed.push(resource);
        }

        Ok(changed)
    }
}
