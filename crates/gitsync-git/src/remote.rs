//! Remote inspection without a local repository

use git2::{Direction, Remote};

use crate::provider::RemoteInspector;
use crate::{Error, RemoteAuth, Result};

/// [`RemoteInspector`] backed by a detached git2 remote (`git ls-remote`).
#[derive(Debug, Clone, Default)]
pub struct GitRemote {
    auth: RemoteAuth,
}

impl GitRemote {
    pub fn new(auth: RemoteAuth) -> Self {
        Self { auth }
    }
}

impl RemoteInspector for GitRemote {
    fn head_commit(&self, url: &str, branch: &str) -> Result<String> {
        let remote_error = |e: git2::Error| Error::Remote {
            url: url.to_string(),
            message: e.message().to_string(),
        };

        let mut remote = Remote::create_detached(url).map_err(remote_error)?;
        let connection = remote
            .connect_auth(Direction::Fetch, Some(self.auth.callbacks()), None)
            .map_err(remote_error)?;

        let wanted = format!("refs/heads/{branch}");
        let head = connection
            .list()
            .map_err(remote_error)?
            .iter()
            .find(|head| head.name() == wanted)
            .map(|head| head.oid().to_string());

        tracing::debug!(url, branch, commit = ?head, "Resolved remote head");
        head.ok_or_else(|| Error::BranchNotFound {
            url: url.to_string(),
            name: branch.to_string(),
        })
    }
}
