//! Error types for gitsync-core

use std::path::PathBuf;

/// Result type for gitsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling a repository.
///
/// Every error is fatal to the run it occurs in.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Destination resolves outside the working copy, or to its root
    #[error("Destination '{destination}' is not inside the repository at {root}")]
    PathSafetyViolation { destination: String, root: PathBuf },

    /// Source file, directory or template does not exist
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Template could not be rendered
    #[error("Failed to render template {template}: {message}")]
    RenderFailure { template: PathBuf, message: String },

    /// Something exists at a subrepo destination but is not a readable subrepo
    #[error("Subrepo at '{directory}' is in an unrecognized state: {message}")]
    SubrepoStateCorrupt { directory: String, message: String },

    /// Remote could not be reached or did not have what was asked for
    #[error("Remote '{url}' failed: {message}")]
    RemoteFailure { url: String, message: String },

    /// Copy or write into the working copy failed
    #[error("Failed to apply {destination}: {message}")]
    ConvergenceApplyFailure { destination: PathBuf, message: String },

    /// No committer identity available
    #[error("Cannot commit: git config '{key}' is not set and no committer was configured")]
    CommitIdentityMissing { key: String },

    /// Working copy operation attempted outside checkout
    #[error("Repository is not checked out")]
    RepositoryNotCheckedOut,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from gitsync-fs
    #[error(transparent)]
    Fs(#[from] gitsync_fs::Error),

    /// Git error from gitsync-git
    #[error(transparent)]
    Git(gitsync_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

impl From<gitsync_git::Error> for Error {
    fn from(error: gitsync_git::Error) -> Self {
        use gitsync_git::Error as Git;

        match error {
            Git::NotCheckedOut => Self::RepositoryNotCheckedOut,
            Git::IdentityMissing { key } => Self::CommitIdentityMissing { key },
            Git::Remote { url, message } => Self::RemoteFailure { url, message },
            Git::BranchNotFound { url, name } => Self::RemoteFailure {
                url,
                message: format!("branch '{name}' not found"),
            },
            Git::CommitNotFound { url, commit } => Self::RemoteFailure {
                url,
                message: format!("commit '{commit}' not found"),
            },
            Git::CorruptMetadata { path, message } => Self::SubrepoStateCorrupt {
                directory: path.parent().unwrap_or(path.as_path()).display().to_string(),
                message,
            },
            Git::Fs(e) => Self::Fs(e),
            other => Self::Git(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_errors_map_onto_taxonomy() {
        let err: Error = gitsync_git::Error::NotCheckedOut.into();
        assert!(matches!(err, Error::RepositoryNotCheckedOut));

        let err: Error = gitsync_git::Error::IdentityMissing {
            key: "user.email".into(),
        }
        .into();
        assert!(matches!(err, Error::CommitIdentityMissing { ref key } if key == "user.email"));

        let err: Error = gitsync_git::Error::BranchNotFound {
            url: "u".into(),
            name: "b".into(),
        }
        .into();
        assert!(matches!(err, Error::RemoteFailure { .. }));
        assert!(err.to_string().contains("branch 'b'"));
    }

    #[test]
    fn corrupt_metadata_names_the_subrepo_directory() {
        let err: Error = gitsync_git::Error::CorruptMetadata {
            path: PathBuf::from("/work/vendor/shared/.gitrepo"),
            message: "subrepo.commit: not found".into(),
        }
        .into();

        match err {
            Error::SubrepoStateCorrupt { directory, .. } => {
                assert_eq!(directory, "/work/vendor/shared")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn path_safety_violation_displays_destination() {
        let err = Error::PathSafetyViolation {
            destination: "../escape.txt".into(),
            root: PathBuf::from("/tmp/checkout"),
        };
        assert!(err.to_string().contains("../escape.txt"));
    }
}
