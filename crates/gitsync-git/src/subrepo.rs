//! Third-party repositories embedded in the working copy
//!
//! An embedded subrepo is a plain directory: the upstream tree at some commit,
//! without a nested `.git`, plus a `.gitrepo` file recording where it came
//! from. The `.gitrepo` file uses git-config syntax:
//!
//! ```text
//! [subrepo]
//!     remote = https://example.com/shared.git
//!     branch = master
//!     commit = 4b825dc642cb6eb9a060e54bf8d69288fbee4904
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use gitsync_fs::{MarkerPath, NormalizedPath, mirror_tree};

use crate::provider::SubrepoStore;
use crate::{Error, GitCheckout, RemoteAuth, Result, helpers};

/// Entries of the upstream tree that never land in the subrepo directory, and
/// entries of the subrepo directory a mirror must leave alone.
const MIRROR_EXCLUDES: &[&str] = &[MarkerPath::GitDir.as_str(), MarkerPath::SubrepoMetadata.as_str()];

/// Contents of a `.gitrepo` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubrepoMetadata {
    pub remote: String,
    pub branch: String,
    pub commit: String,
}

impl SubrepoMetadata {
    /// Location of the metadata file for a subrepo at `directory`.
    pub fn path(directory: &Path) -> PathBuf {
        directory.join(MarkerPath::SubrepoMetadata)
    }

    /// Read the metadata of the subrepo at `directory`.
    ///
    /// Returns `Ok(None)` if there is no metadata file. A file that exists but
    /// lacks any of the three keys is [`Error::CorruptMetadata`].
    pub fn read(directory: &Path) -> Result<Option<Self>> {
        let path = Self::path(directory);
        if !path.is_file() {
            return Ok(None);
        }

        let config = git2::Config::open(&path).map_err(|e| Error::CorruptMetadata {
            path: path.clone(),
            message: e.message().to_string(),
        })?;
        let get = |key: &str| {
            config.get_string(key).map_err(|e| Error::CorruptMetadata {
                path: path.clone(),
                message: format!("{key}: {}", e.message()),
            })
        };

        Ok(Some(Self {
            remote: get("subrepo.remote")?,
            branch: get("subrepo.branch")?,
            commit: get("subrepo.commit")?,
        }))
    }

    /// Replace the metadata file of the subrepo at `directory`.
    pub fn write(&self, directory: &Path) -> Result<()> {
        let path = Self::path(directory);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::Io {
                path: path.clone(),
                source: e,
            })?;
        }

        let mut config = git2::Config::open(&path)?;
        config.set_str("subrepo.remote", &self.remote)?;
        config.set_str("subrepo.branch", &self.branch)?;
        config.set_str("subrepo.commit", &self.commit)?;
        Ok(())
    }
}

/// [`SubrepoStore`] keeping subrepos as embedded trees with `.gitrepo`
/// metadata.
///
/// Every clone and pull fetches into a scratch clone, checks out the wanted
/// commit and mirrors its tree into place, so the embedded tree always equals
/// the upstream tree at the recorded commit.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedSubrepoStore {
    auth: RemoteAuth,
}

impl EmbeddedSubrepoStore {
    pub fn new(auth: RemoteAuth) -> Self {
        Self { auth }
    }

    fn materialize(&self, url: &str, branch: &str, commit: Option<&str>, target: &Path) -> Result<String> {
        let scratch = tempfile::Builder::new()
            .prefix("gitsync-subrepo-")
            .tempdir()
            .map_err(|e| Error::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;

        let repo = helpers::clone_branch(url, scratch.path(), branch, &self.auth)?;
        let resolved = match commit {
            Some(commit) => helpers::checkout_commit(&repo, url, commit)?,
            None => helpers::head_commit(&repo)?,
        };

        mirror_tree(scratch.path(), target, MIRROR_EXCLUDES)?;
        SubrepoMetadata {
            remote: url.to_string(),
            branch: branch.to_string(),
            commit: resolved.clone(),
        }
        .write(target)?;

        tracing::debug!(url, branch, commit = %resolved, target = %target.display(), "Embedded subrepo");
        Ok(resolved)
    }
}

impl SubrepoStore for EmbeddedSubrepoStore {
    fn status(&self, root: &Path, directory: &NormalizedPath) -> Result<Option<GitCheckout>> {
        let path = root.join(directory.to_native());
        if !path.is_dir() {
            return Ok(None);
        }

        Ok(SubrepoMetadata::read(&path)?.map(|metadata| {
            GitCheckout::new(
                metadata.remote,
                metadata.branch,
                directory.clone(),
                Some(metadata.commit),
            )
        }))
    }

    fn clone_subrepo(&self, root: &Path, checkout: &GitCheckout) -> Result<String> {
        let target = root.join(checkout.directory.to_native());
        if fs::symlink_metadata(&target).is_ok() {
            return Err(Error::DestinationExists { path: target });
        }

        self.materialize(&checkout.url, &checkout.branch, checkout.commit.as_deref(), &target)
    }

    fn pull(&self, root: &Path, directory: &NormalizedPath) -> Result<String> {
        let target = root.join(directory.to_native());
        let metadata = SubrepoMetadata::read(&target)?.ok_or_else(|| Error::CorruptMetadata {
            path: SubrepoMetadata::path(&target),
            message: "missing".into(),
        })?;

        self.materialize(&metadata.remote, &metadata.branch, None, &target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitsync_test_utils::git::{BareRemote, real_git_repo};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> EmbeddedSubrepoStore {
        EmbeddedSubrepoStore::default()
    }

    #[test]
    fn metadata_roundtrip() {
        let temp = TempDir::new().unwrap();
        let metadata = SubrepoMetadata {
            remote: "https://example.com/shared.git".into(),
            branch: "main".into(),
            commit: "abc".into(),
        };

        metadata.write(temp.path()).unwrap();
        assert_eq!(SubrepoMetadata::read(temp.path()).unwrap(), Some(metadata));
    }

    #[test]
    fn metadata_missing_key_is_corrupt() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gitrepo"), "[subrepo]\n\tremote = x\n").unwrap();

        let err = SubrepoMetadata::read(temp.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptMetadata { .. }));
    }

    #[test]
    fn status_of_missing_or_plain_directory_is_none() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("plain")).unwrap();

        assert_eq!(store().status(temp.path(), &"missing".into()).unwrap(), None);
        assert_eq!(store().status(temp.path(), &"plain".into()).unwrap(), None);
    }

    #[test]
    fn nested_git_repository_is_not_an_embedded_subrepo() {
        let temp = TempDir::new().unwrap();
        real_git_repo(&temp.path().join("nested"));

        assert_eq!(store().status(temp.path(), &"nested".into()).unwrap(), None);
    }

    #[test]
    fn clone_embeds_branch_head() {
        let upstream = BareRemote::with_files("main", &[("lib.txt", "v1"), ("src/mod.txt", "m")]);
        let root = TempDir::new().unwrap();
        let desired = GitCheckout::new(upstream.url(), "main", "vendor/shared", None);

        let commit = store().clone_subrepo(root.path(), &desired).unwrap();

        assert_eq!(commit, upstream.head("main"));
        let embedded = root.path().join("vendor/shared");
        assert_eq!(fs::read_to_string(embedded.join("lib.txt")).unwrap(), "v1");
        assert!(!embedded.join(".git").exists());
        assert_eq!(
            store().status(root.path(), &desired.directory).unwrap(),
            Some(desired.at_commit(commit))
        );
    }

    #[test]
    fn clone_pins_requested_commit() {
        let upstream = BareRemote::with_files("main", &[("lib.txt", "v1")]);
        let pinned = upstream.head("main");
        upstream.commit_files("main", &[("lib.txt", "v2")], "v2");
        let root = TempDir::new().unwrap();
        let desired = GitCheckout::new(upstream.url(), "main", "shared", Some(pinned.clone()));

        assert_eq!(store().clone_subrepo(root.path(), &desired).unwrap(), pinned);
        assert_eq!(fs::read_to_string(root.path().join("shared/lib.txt")).unwrap(), "v1");
    }

    #[test]
    fn clone_refuses_existing_destination() {
        let upstream = BareRemote::with_files("main", &[("lib.txt", "v1")]);
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("shared")).unwrap();
        let desired = GitCheckout::new(upstream.url(), "main", "shared", None);

        assert!(matches!(
            store().clone_subrepo(root.path(), &desired),
            Err(Error::DestinationExists { .. })
        ));
    }

    #[test]
    fn pull_moves_to_branch_head() {
        let upstream = BareRemote::with_files("main", &[("lib.txt", "v1")]);
        let root = TempDir::new().unwrap();
        let desired = GitCheckout::new(upstream.url(), "main", "shared", None);
        store().clone_subrepo(root.path(), &desired).unwrap();

        let seed = upstream.commit_files("main", &[("lib.txt", "v2")], "v2");
        let pulled = store().pull(root.path(), &desired.directory).unwrap();

        assert_eq!(pulled, seed);
        assert_eq!(fs::read_to_string(root.path().join("shared/lib.txt")).unwrap(), "v2");
        assert_eq!(
            SubrepoMetadata::read(&root.path().join("shared")).unwrap().unwrap().commit,
            seed
        );
    }

    #[test]
    fn pull_without_metadata_is_corrupt() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("shared")).unwrap();

        assert!(matches!(
            store().pull(root.path(), &"shared".into()),
            Err(Error::CorruptMetadata { .. })
        ));
    }
}
