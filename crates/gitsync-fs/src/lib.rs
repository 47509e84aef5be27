//! Filesystem primitives for gitsync
//!
//! Provides repo-relative path handling, atomic writes, content-based tree
//! comparison and mirror copying. Nothing in here knows about git.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod mirror;
pub mod path;
pub mod tree;

pub use config::ConfigStore;
pub use constants::MarkerPath;
pub use error::{Error, Result};
pub use mirror::{mirror_tree, write_file};
pub use path::NormalizedPath;
pub use tree::{EntryKind, TreeEntry, TreeSnapshot};
