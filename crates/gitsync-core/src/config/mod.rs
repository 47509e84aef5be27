//! Configuration loading
//!
//! A manifest file describes the repository to manage and the resources to
//! keep in it. It is read by [`gitsync_fs::ConfigStore`], so TOML, YAML and
//! JSON are all accepted.

mod manifest;

pub use manifest::{
    FileEntry, Manifest, RepositorySettings, SubrepoEntry, TemplateEntry, DEFAULT_BRANCH,
};
