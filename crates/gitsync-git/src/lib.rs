//! Git collaborators for gitsync
//!
//! Provides the working copy the engine commits to, the store for embedded
//! third-party repositories, and remote head lookups, all on top of git2.

pub mod auth;
pub mod checkout;
pub mod error;
pub mod helpers;
pub mod provider;
pub mod remote;
pub mod subrepo;
pub mod working_copy;

pub use auth::RemoteAuth;
pub use checkout::{GitCheckout, commit_matches};
pub use error::{Error, Result};
pub use provider::{RemoteInspector, SubrepoStore, WorkingCopy};
pub use remote::GitRemote;
pub use subrepo::{EmbeddedSubrepoStore, SubrepoMetadata};
pub use working_copy::{GitWorkingCopy, Identity};
