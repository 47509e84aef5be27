//! Collaborator traits the reconciliation engine is written against
//!
//! Each trait has a git-backed implementation in this crate; tests substitute
//! in-memory fakes.

use std::path::{Path, PathBuf};

use gitsync_fs::NormalizedPath;

use crate::{GitCheckout, Result};

/// A local, temporary checkout of the remote repository being managed.
///
/// Lifecycle: `checkout` once, then any number of `commit` and `push` calls,
/// then `teardown`. Every operation other than `checkout` fails with
/// [`Error::NotCheckedOut`](crate::Error::NotCheckedOut) outside that window.
pub trait WorkingCopy {
    /// Clone the configured branch into a fresh directory, created under
    /// `parent` when given, and return its root.
    fn checkout(&mut self, parent: Option<&Path>) -> Result<PathBuf>;

    /// Root of the current checkout.
    fn root(&self) -> Result<&Path>;

    /// Stage and commit.
    ///
    /// With `changed_paths`, only those repository-relative paths are staged,
    /// additions and removals alike; an empty slice commits nothing. Without
    /// it, every change in the working tree is staged.
    ///
    /// Returns whether a commit was created. Nothing is committed when the
    /// staged tree equals `HEAD`.
    fn commit(&mut self, message: &str, changed_paths: Option<&[NormalizedPath]>) -> Result<bool>;

    /// Push the configured branch to the remote.
    fn push(&mut self) -> Result<()>;

    /// Remove the checkout. Idempotent.
    fn teardown(&mut self) -> Result<()>;
}

/// Storage of third-party repositories embedded inside the working copy.
///
/// `root` is always the working copy root; directories are relative to it.
pub trait SubrepoStore {
    /// Describe the subrepo at `directory`, or `None` when nothing there is
    /// recognizable as one.
    fn status(&self, root: &Path, directory: &NormalizedPath) -> Result<Option<GitCheckout>>;

    /// Embed `checkout` at its directory, which must not exist. The branch
    /// head is used unless the checkout names a commit.
    ///
    /// Returns the full hash of the embedded commit.
    fn clone_subrepo(&self, root: &Path, checkout: &GitCheckout) -> Result<String>;

    /// Bring an existing subrepo up to its branch head.
    ///
    /// Returns the full hash of the embedded commit.
    fn pull(&self, root: &Path, directory: &NormalizedPath) -> Result<String>;
}

/// Read-only queries against remote repositories.
pub trait RemoteInspector {
    /// Full hash of the head commit of `branch` at `url`.
    fn head_commit(&self, url: &str, branch: &str) -> Result<String>;
}
