//! Destination containment checks
//!
//! Purely lexical: nothing here touches the filesystem, so a destination is
//! rejected before any directory is created for it.

use std::path::{Path, PathBuf};

use gitsync_fs::NormalizedPath;

use crate::{Error, Result};

/// Resolve `destination` against the working copy `root`.
///
/// The resolved path must be a strict descendant of `root`: a destination
/// that resolves to the root itself, or that leaves it through `..` or an
/// absolute path elsewhere, is a [`Error::PathSafetyViolation`].
///
/// Returns the absolute target path.
pub fn validate_destination(destination: &NormalizedPath, root: &Path) -> Result<PathBuf> {
    let base = NormalizedPath::new(root);
    let resolved = base.join(destination.as_str());

    match resolved.strip_prefix(&base) {
        Some(relative) if !relative.is_current_dir() && !relative.escapes() => {
            Ok(resolved.to_native())
        }
        _ => {
            tracing::warn!(destination = %destination, root = %root.display(), "Rejected destination");
            Err(Error::PathSafetyViolation {
                destination: destination.to_string(),
                root: root.to_path_buf(),
            })
        }
    }
}
