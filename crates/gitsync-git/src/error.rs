//! Error types for gitsync-git

use std::path::PathBuf;

/// Result type for gitsync-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gitsync-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] gitsync_fs::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository is not checked out")]
    NotCheckedOut,

    #[error("Repository is already checked out at {path}")]
    AlreadyCheckedOut { path: PathBuf },

    #[error("Cannot commit: git config '{key}' is not set and no committer was configured")]
    IdentityMissing { key: String },

    #[error("Remote '{url}' failed: {message}")]
    Remote { url: String, message: String },

    #[error("Branch '{name}' not found on '{url}'")]
    BranchNotFound { url: String, name: String },

    #[error("Commit '{commit}' not found in '{url}'")]
    CommitNotFound { url: String, commit: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Subrepo metadata at {path} is unreadable: {message}")]
    CorruptMetadata { path: PathBuf, message: String },

    #[error("Cannot clone into {path}: destination already exists")]
    DestinationExists { path: PathBuf },
}
