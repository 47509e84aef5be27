//! Temporary git checkout of the repository being synchronised

use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, Signature};
use gitsync_fs::NormalizedPath;
use tempfile::TempDir;

use crate::provider::WorkingCopy;
use crate::{Error, RemoteAuth, Result, helpers};

/// Author and committer of sync commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A [`WorkingCopy`] backed by a fresh clone in a temporary directory.
///
/// The clone is deleted on [`teardown`](WorkingCopy::teardown), or when the
/// value is dropped.
pub struct GitWorkingCopy {
    remote: String,
    branch: String,
    identity: Option<Identity>,
    auth: RemoteAuth,
    checkout: Option<TempDir>,
}

impl GitWorkingCopy {
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            branch: branch.into(),
            identity: None,
            auth: RemoteAuth::default(),
            checkout: None,
        }
    }

    /// Commit as `identity` instead of the `user.name`/`user.email` git config.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_auth(mut self, auth: RemoteAuth) -> Self {
        self.auth = auth;
        self
    }

    fn repository(&self) -> Result<Repository> {
        Ok(Repository::open(self.root()?)?)
    }

    fn signature(&self, repo: &Repository) -> Result<Signature<'static>> {
        if let Some(identity) = &self.identity {
            return Ok(Signature::now(&identity.name, &identity.email)?);
        }

        let config = repo.config()?;
        let lookup = |key: &str| {
            config.get_string(key).map_err(|_| Error::IdentityMissing {
                key: key.to_string(),
            })
        };
        let name = lookup("user.name")?;
        let email = lookup("user.email")?;
        Ok(Signature::now(&name, &email)?)
    }
}

impl WorkingCopy for GitWorkingCopy {
    fn checkout(&mut self, parent: Option<&Path>) -> Result<PathBuf> {
        if let Some(existing) = &self.checkout {
            return Err(Error::AlreadyCheckedOut {
                path: existing.path().to_path_buf(),
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("gitsync-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Io {
            path: parent.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir),
            source: e,
        })?;

        tracing::debug!(
            remote = %self.remote,
            branch = %self.branch,
            path = %dir.path().display(),
            "Checking out working copy"
        );
        helpers::clone_branch(&self.remote, dir.path(), &self.branch, &self.auth)?;

        let root = dir.path().to_path_buf();
        self.checkout = Some(dir);
        Ok(root)
    }

    fn root(&self) -> Result<&Path> {
        self.checkout
            .as_ref()
            .map(TempDir::path)
            .ok_or(Error::NotCheckedOut)
    }

    fn commit(&mut self, message: &str, changed_paths: Option<&[NormalizedPath]>) -> Result<bool> {
        let root = self.root()?.to_path_buf();
        if changed_paths.is_some_and(<[NormalizedPath]>::is_empty) {
            return Ok(false);
        }

        let repo = self.repository()?;
        let signature = self.signature(&repo)?;
        let mut index = repo.index()?;

        match changed_paths {
            Some(paths) => {
                for path in paths {
                    let spec = path.as_str();
                    index.remove_all([spec], None)?;
                    if root.join(path.to_native()).exists() {
                        index.add_all([spec], IndexAddOption::DEFAULT, None)?;
                    }
                }
            }
            None => {
                index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
                index.update_all(["*"], None)?;
            }
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        if let Some(parent) = &parent
            && parent.tree_id() == tree_id
        {
            tracing::debug!(message, "Nothing to commit");
            return Ok(false);
        }

        let tree = repo.find_tree(tree_id)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let id = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        tracing::info!(commit = %id, message, "Committed");
        Ok(true)
    }

    fn push(&mut self) -> Result<()> {
        let repo = self.repository()?;
        tracing::info!(remote = %self.remote, branch = %self.branch, "Pushing");
        helpers::push(&repo, "origin", &self.branch, &self.auth)
    }

    fn teardown(&mut self) -> Result<()> {
        if let Some(dir) = self.checkout.take() {
            let path = dir.path().to_path_buf();
            tracing::debug!(path = %path.display(), "Removing working copy");
            dir.close().map_err(|e| Error::Io { path, source: e })?;
        }
        Ok(())
    }
}
