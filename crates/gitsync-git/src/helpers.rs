//! Shared git2 helper functions
//!
//! These functions encapsulate the clone, checkout and push patterns used by
//! the working copy and the subrepo store.

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::Repository;

use crate::{Error, RemoteAuth, Result};

/// Clone `branch` of `url` into `dest`.
///
/// `dest` must be missing or an empty directory.
pub fn clone_branch(url: &str, dest: &Path, branch: &str, auth: &RemoteAuth) -> Result<Repository> {
    let mut builder = RepoBuilder::new();
    builder.branch(branch);
    builder.fetch_options(auth.fetch_options());

    builder.clone(url, dest).map_err(|e| {
        if e.code() == git2::ErrorCode::NotFound && e.message().contains(branch) {
            Error::BranchNotFound {
                url: url.to_string(),
                name: branch.to_string(),
            }
        } else {
            Error::Remote {
                url: url.to_string(),
                message: e.message().to_string(),
            }
        }
    })
}

/// Full hash of the commit `HEAD` points at.
pub fn head_commit(repo: &Repository) -> Result<String> {
    let head = repo.head()?;
    Ok(head.peel_to_commit()?.id().to_string())
}

/// Check out `commit` with a detached `HEAD`, discarding any local changes.
///
/// Accepts anything `git rev-parse` would; returns the full hash.
///
/// # Arguments
/// * `repo` - The repository to check out in
/// * `url` - Remote the repository came from, for error reporting
/// * `commit` - The commit to check out
pub fn checkout_commit(repo: &Repository, url: &str, commit: &str) -> Result<String> {
    let target = repo
        .revparse_single(commit)
        .and_then(|object| object.peel_to_commit())
        .map_err(|_| Error::CommitNotFound {
            url: url.to_string(),
            commit: commit.to_string(),
        })?;

    let mut checkout = CheckoutBuilder::new();
    checkout.force();
    repo.checkout_tree(target.as_object(), Some(&mut checkout))?;
    repo.set_head_detached(target.id())?;

    Ok(target.id().to_string())
}

/// Push a local branch to the same-named branch of a remote.
///
/// Rejections reported by the remote (for example a non-fast-forward update)
/// are returned as [`Error::PushFailed`] rather than silently ignored.
///
/// # Arguments
/// * `repo` - The repository to push from
/// * `remote` - Remote name
/// * `branch` - Branch to push
/// * `auth` - Credentials for the remote
pub fn push(repo: &Repository, remote: &str, branch: &str, auth: &RemoteAuth) -> Result<()> {
    let mut remote = repo.find_remote(remote).map_err(|e| Error::Remote {
        url: remote.to_string(),
        message: e.message().to_string(),
    })?;

    let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
    let mut rejection = None;

    {
        let mut callbacks = auth.callbacks();
        callbacks.push_update_reference(|reference, status| {
            if let Some(status) = status {
                rejection = Some(format!("{reference} rejected: {status}"));
            }
            Ok(())
        });
        let mut options = git2::PushOptions::new();
        options.remote_callbacks(callbacks);

        remote
            .push(&[&refspec], Some(&mut options))
            .map_err(|e| Error::PushFailed {
                message: e.message().to_string(),
            })?;
    }

    match rejection {
        Some(message) => Err(Error::PushFailed { message }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitsync_test_utils::git::{BareRemote, commit_file};
    use tempfile::TempDir;

    #[test]
    fn clone_requires_valid_url() {
        let temp = TempDir::new().unwrap();
        let result = clone_branch(
            "not-a-valid-url",
            &temp.path().join("clone"),
            "main",
            &RemoteAuth::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn clone_checks_out_requested_branch() {
        let remote = BareRemote::with_files("main", &[("README.md", "hello")]);
        let temp = TempDir::new().unwrap();

        let repo = clone_branch(&remote.url(), &temp.path().join("clone"), "main", &RemoteAuth::new())
            .unwrap();

        assert_eq!(head_commit(&repo).unwrap(), remote.head("main"));
        assert!(temp.path().join("clone/README.md").exists());
    }

    #[test]
    fn clone_of_missing_branch_fails() {
        let remote = BareRemote::with_files("main", &[("README.md", "hello")]);
        let temp = TempDir::new().unwrap();

        let result = clone_branch(
            &remote.url(),
            &temp.path().join("clone"),
            "does-not-exist",
            &RemoteAuth::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn checkout_commit_detaches_head() {
        let remote = BareRemote::with_files("main", &[("a.txt", "one")]);
        let first = remote.head("main");
        remote.commit_files("main", &[("a.txt", "two")], "Second");
        let temp = TempDir::new().unwrap();
        let repo = clone_branch(&remote.url(), temp.path(), "main", &RemoteAuth::new()).unwrap();

        let resolved = checkout_commit(&repo, &remote.url(), &first[..10]).unwrap();

        assert_eq!(resolved, first);
        assert!(repo.head_detached().unwrap());
        assert_eq!(std::fs::read_to_string(temp.path().join("a.txt")).unwrap(), "one");
    }

    #[test]
    fn checkout_of_unknown_commit_fails() {
        let remote = BareRemote::with_files("main", &[("a.txt", "one")]);
        let temp = TempDir::new().unwrap();
        let repo = clone_branch(&remote.url(), temp.path(), "main", &RemoteAuth::new()).unwrap();

        let err = checkout_commit(&repo, &remote.url(), "0123456789abcdef0123456789abcdef01234567")
            .unwrap_err();
        assert!(matches!(err, Error::CommitNotFound { .. }));
    }

    #[test]
    fn push_updates_remote_branch() {
        let remote = BareRemote::with_files("main", &[("a.txt", "one")]);
        let temp = TempDir::new().unwrap();
        let repo = clone_branch(&remote.url(), temp.path(), "main", &RemoteAuth::new()).unwrap();
        let pushed = commit_file(temp.path(), "b.txt", "two", "Add b");

        push(&repo, "origin", "main", &RemoteAuth::new()).unwrap();

        assert_eq!(remote.head("main"), pushed);
    }
}
