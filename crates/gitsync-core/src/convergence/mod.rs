//! Per-kind convergence of desired resources onto the working copy
//!
//! Each kind has one [`Convergence`] implementation. A convergence reads the
//! current state from disk, compares it with the desired state and applies
//! the difference when permitted. Nothing is cached between calls.

mod file;
mod subrepo;
mod template;

pub use file::FileConvergence;
pub use subrepo::SubrepoConvergence;
pub use template::TemplateConvergence;

use std::path::Path;

use gitsync_git::WorkingCopy;

use crate::{Error, Result};

/// What converging one resource did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already in the desired state
    Unchanged,
    /// Destination exists and differs, but may not be overwritten
    Skipped,
    /// Subrepo diverges from the desired checkout, but may not be updated
    Blocked,
    /// The working copy was modified
    Applied,
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Converges one kind of resource.
pub trait Convergence {
    type Resource;

    /// Bring the working copy in line with `resource`.
    fn converge(&self, resource: &Self::Resource, working_copy: &mut dyn WorkingCopy) -> Result<Outcome>;
}

/// Preconditions shared by file and template sources.
fn check_source(source: &Path) -> Result<()> {
    if !source.is_absolute() {
        return Err(Error::configuration(format!(
            "source must be an absolute path: {}",
            source.display()
        )));
    }
    if std::fs::symlink_metadata(source).is_err() {
        return Err(Error::SourceNotFound {
            path: source.to_path_buf(),
        });
    }
    Ok(())
}

fn exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators for convergence and engine tests.

    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    use gitsync_fs::NormalizedPath;
    use gitsync_git::{GitCheckout, RemoteInspector, SubrepoStore, WorkingCopy};
    use tempfile::TempDir;

    /// A working copy that is a plain temporary directory and records every
    /// commit and push instead of talking to git.
    #[derive(Default)]
    pub struct RecordingWorkingCopy {
        dir: Option<TempDir>,
        pub commits: Vec<(String, Option<Vec<String>>)>,
        pub pushes: usize,
        pub teardowns: usize,
        pub last_root: Option<PathBuf>,
    }

    impl RecordingWorkingCopy {
        pub fn checked_out() -> Self {
            let mut copy = Self::default();
            copy.checkout(None).unwrap();
            copy
        }

        pub fn commit_messages(&self) -> Vec<&str> {
            self.commits.iter().map(|(m, _)| m.as_str()).collect()
        }
    }

    impl WorkingCopy for RecordingWorkingCopy {
        fn checkout(&mut self, _parent: Option<&Path>) -> gitsync_git::Result<PathBuf> {
            let dir = TempDir::new().unwrap();
            let root = dir.path().to_path_buf();
            self.dir = Some(dir);
            self.last_root = Some(root.clone());
            Ok(root)
        }

        fn root(&self) -> gitsync_git::Result<&Path> {
            self.dir
                .as_ref()
                .map(TempDir::path)
                .ok_or(gitsync_git::Error::NotCheckedOut)
        }

        fn commit(
            &mut self,
            message: &str,
            changed_paths: Option<&[NormalizedPath]>,
        ) -> gitsync_git::Result<bool> {
            self.root()?;
            self.commits.push((
                message.to_string(),
                changed_paths.map(|paths| paths.iter().map(ToString::to_string).collect()),
            ));
            Ok(true)
        }

        fn push(&mut self) -> gitsync_git::Result<()> {
            self.root()?;
            self.pushes += 1;
            Ok(())
        }

        fn teardown(&mut self) -> gitsync_git::Result<()> {
            self.teardowns += 1;
            self.dir = None;
            Ok(())
        }
    }

    /// Subrepo store keeping state in a `.fake-subrepo` marker file, with the
    /// upstream branch heads held in memory.
    #[derive(Default)]
    pub struct FakeSubrepos {
        /// (url, branch) -> head commit
        pub heads: BTreeMap<(String, String), String>,
        /// Commit a pull lands on, when it should differ from the head
        pub pull_lands_on: Option<String>,
        pub calls: RefCell<Vec<String>>,
    }

    const MARKER: &str = ".fake-subrepo";

    impl FakeSubrepos {
        pub fn with_head(mut self, url: &str, branch: &str, commit: &str) -> Self {
            self.heads
                .insert((url.to_string(), branch.to_string()), commit.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        /// Materialize a subrepo on disk as if it had been cloned earlier.
        pub fn seed(root: &Path, checkout: &GitCheckout) {
            let dir = root.join(checkout.directory.to_native());
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(
                dir.join(MARKER),
                format!(
                    "{}\n{}\n{}\n",
                    checkout.url,
                    checkout.branch,
                    checkout.commit.as_deref().unwrap_or_default()
                ),
            )
            .unwrap();
        }

        fn head(&self, url: &str, branch: &str) -> gitsync_git::Result<String> {
            self.heads
                .get(&(url.to_string(), branch.to_string()))
                .cloned()
                .ok_or_else(|| gitsync_git::Error::BranchNotFound {
                    url: url.to_string(),
                    name: branch.to_string(),
                })
        }
    }

    impl SubrepoStore for FakeSubrepos {
        fn status(
            &self,
            root: &Path,
            directory: &NormalizedPath,
        ) -> gitsync_git::Result<Option<GitCheckout>> {
            let marker = root.join(directory.to_native()).join(MARKER);
            let Ok(content) = std::fs::read_to_string(marker) else {
                return Ok(None);
            };
            let mut lines = content.lines();
            let (Some(url), Some(branch), Some(commit)) = (lines.next(), lines.next(), lines.next())
            else {
                return Ok(None);
            };
            Ok(Some(GitCheckout::new(
                url,
                branch,
                directory.clone(),
                Some(commit.to_string()),
            )))
        }

        fn clone_subrepo(&self, root: &Path, checkout: &GitCheckout) -> gitsync_git::Result<String> {
            self.calls
                .borrow_mut()
                .push(format!("clone {}", checkout.directory));
            let commit = match &checkout.commit {
                Some(commit) => commit.clone(),
                None => self.head(&checkout.url, &checkout.branch)?,
            };
            Self::seed(root, &checkout.at_commit(commit.clone()));
            Ok(commit)
        }

        fn pull(&self, root: &Path, directory: &NormalizedPath) -> gitsync_git::Result<String> {
            self.calls.borrow_mut().push(format!("pull {directory}"));
            let current = self.status(root, directory)?.ok_or_else(|| {
                gitsync_git::Error::CorruptMetadata {
                    path: root.join(directory.to_native()),
                    message: "missing".into(),
                }
            })?;
            let commit = match &self.pull_lands_on {
                Some(commit) => commit.clone(),
                None => self.head(&current.url, &current.branch)?,
            };
            Self::seed(root, &current.at_commit(commit.clone()));
            Ok(commit)
        }
    }

    impl RemoteInspector for FakeSubrepos {
        fn head_commit(&self, url: &str, branch: &str) -> gitsync_git::Result<String> {
            self.calls.borrow_mut().push(format!("ls-remote {url}#{branch}"));
            self.head(url, branch)
        }
    }
}
