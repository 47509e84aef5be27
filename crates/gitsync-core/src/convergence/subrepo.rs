use gitsync_fs::io::remove_path;
use gitsync_git::{RemoteInspector, SubrepoStore, WorkingCopy, commit_matches};

use super::{Convergence, Outcome, exists};
use crate::model::SubrepoResource;
use crate::safety::validate_destination;
use crate::{Error, Result};

/// Converges embedded subrepos.
///
/// Decision order for a subrepo whose directory exists:
/// 1. When no commit is pinned and the origin matches, the desired commit is
///    the remote branch head.
/// 2. Already at the desired checkout (an abbreviated pinned commit matches
///    by prefix): nothing to do.
/// 3. Overwrite disabled: left alone.
/// 4. Same origin: pull, done if that lands exactly on the desired commit.
/// 5. Otherwise the directory is removed, the removal committed, and the
///    subrepo cloned afresh.
pub struct SubrepoConvergence<'a> {
    store: &'a dyn SubrepoStore,
    remote: &'a dyn RemoteInspector,
}

impl<'a> SubrepoConvergence<'a> {
    pub fn new(store: &'a dyn SubrepoStore, remote: &'a dyn RemoteInspector) -> Self {
        Self { store, remote }
    }
}

impl Convergence for SubrepoConvergence<'_> {
    type Resource = SubrepoResource;

    fn converge(&self, resource: &SubrepoResource, working_copy: &mut dyn WorkingCopy) -> Result<Outcome> {
        let root = working_copy.root()?.to_path_buf();
        let mut desired = resource.checkout.clone();
        let target = validate_destination(&desired.directory, &root)?;

        if !exists(&target) {
            let commit = self.store.clone_subrepo(&root, &desired)?;
            tracing::info!(checkout = %desired, commit = %commit, "Cloned subrepo");
            return Ok(Outcome::Applied);
        }

        let current = self
            .store
            .status(&root, &desired.directory)?
            .ok_or_else(|| Error::SubrepoStateCorrupt {
                directory: desired.directory.to_string(),
                message: "destination exists but is not a subrepo".into(),
            })?;

        let same_origin = current.same_origin(&desired);
        if desired.commit.is_none() && same_origin {
            desired.commit = Some(self.remote.head_commit(&desired.url, &desired.branch)?);
        }

        if current.satisfies(&desired) {
            tracing::debug!(checkout = %desired, "Subrepo is synchronised");
            return Ok(Outcome::Unchanged);
        }

        if !resource.overwrite {
            tracing::warn!(
                current = %current,
                desired = %desired,
                "Subrepo is not synchronised but overwrite is disabled"
            );
            return Ok(Outcome::Blocked);
        }

        if same_origin {
            tracing::debug!(directory = %desired.directory, "Pulling subrepo");
            let pulled = self.store.pull(&root, &desired.directory)?;
            if desired
                .commit
                .as_deref()
                .is_some_and(|wanted| commit_matches(&pulled, wanted))
            {
                tracing::info!(
                    directory = %desired.directory,
                    from = current.commit.as_deref().unwrap_or_default(),
                    to = %pulled,
                    "Pulled subrepo"
                );
                return Ok(Outcome::Applied);
            }
            tracing::debug!(
                directory = %desired.directory,
                pulled = %pulled,
                "Pull did not reach the desired commit"
            );
        }

        let message = format!("Removing subrepo at {} to force update", desired.directory);
        tracing::info!(directory = %desired.directory, "{message}");
        remove_path(&target)?;
        working_copy.commit(&message, Some(std::slice::from_ref(&desired.directory)))?;

        let commit = self.store.clone_subrepo(&root, &desired)?;
        tracing::info!(checkout = %desired, commit = %commit, "Recloned subrepo");
        Ok(Outcome::Applied)
    }
}
