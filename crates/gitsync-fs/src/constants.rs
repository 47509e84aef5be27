//! Well-known names inside a working copy.

use std::path::Path;

/// Marker paths gitsync treats specially when copying trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPath {
    /// The `.git` directory (Git database)
    GitDir,
    /// The `.gitrepo` file recording a subrepo's origin
    SubrepoMetadata,
}

impl MarkerPath {
    /// Get the string representation of the path.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::SubrepoMetadata => ".gitrepo",
        }
    }
}

impl AsRef<Path> for MarkerPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for MarkerPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MarkerPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
