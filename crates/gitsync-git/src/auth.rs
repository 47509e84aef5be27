//! Credentials for talking to remotes

use std::path::PathBuf;

use git2::{Cred, FetchOptions, RemoteCallbacks};

/// How to authenticate against remotes.
///
/// Without a key file, libgit2's defaults apply: anonymous access for local
/// and public remotes, and the SSH agent where one is running.
#[derive(Debug, Clone, Default)]
pub struct RemoteAuth {
    key_file: Option<PathBuf>,
}

impl RemoteAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate SSH remotes with the given private key.
    pub fn with_key_file(path: impl Into<PathBuf>) -> Self {
        Self {
            key_file: Some(path.into()),
        }
    }

    /// Callbacks carrying these credentials.
    pub fn callbacks<'a>(&self) -> RemoteCallbacks<'a> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(key_file) = self.key_file.clone() {
            callbacks.credentials(move |_url, username, _allowed| {
                Cred::ssh_key(username.unwrap_or("git"), None, &key_file, None)
            });
        }
        callbacks
    }

    pub fn fetch_options<'a>(&self) -> FetchOptions<'a> {
        let mut options = FetchOptions::new();
        options.remote_callbacks(self.callbacks());
        options
    }
}
