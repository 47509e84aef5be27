//! [`TestWorkspace`] builder for gitsync test scenarios.
//!
//! A workspace is a scratch directory holding the source side of a sync:
//! files, templates and the manifest that points at them.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory with helpers for laying out sync sources.
///
/// # Example
///
/// ```rust,no_run
/// use gitsync_test_utils::workspace::TestWorkspace;
///
/// let workspace = TestWorkspace::new();
/// let source = workspace.write("files/README.md", "hello");
/// workspace.write_manifest("gitsync.yaml", "files: []\n");
/// assert!(source.is_absolute());
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the workspace.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file, creating parent directories, and return its absolute path.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a manifest at the workspace root and return its path.
    pub fn write_manifest(&self, name: &str, content: &str) -> PathBuf {
        self.write(name, content)
    }

    /// Create an empty directory and return its absolute path.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Set unix permission bits on a workspace file.
    #[cfg(unix)]
    pub fn chmod(&self, relative: &str, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.path(relative), fs::Permissions::from_mode(mode)).unwrap();
    }
}
