//! Content-based snapshots of files and directory trees
//!
//! Two snapshots compare equal exactly when a mirror copy between the two
//! locations would be a no-op: same structure, same bytes, same permission
//! bits and same symlink targets. Timestamps never take part.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::checksum::compute_content_checksum;
use crate::io::permission_bits;
use crate::{Error, Result};

/// What kind of entry lives at a path, with the data that identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File { checksum: String },
    Dir,
    Symlink { target: PathBuf },
}

/// A single entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub kind: EntryKind,
    /// Permission bits, see [`permission_bits`]. Always zero for symlinks.
    pub mode: u32,
}

/// Snapshot of a file or directory tree keyed by path relative to its root.
///
/// The root itself is stored under the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeSnapshot {
    entries: BTreeMap<PathBuf, TreeEntry>,
}

impl TreeSnapshot {
    /// Capture the tree rooted at `root`.
    ///
    /// Returns `Ok(None)` if nothing exists at `root`.
    pub fn capture(root: &Path) -> Result<Option<Self>> {
        Self::capture_excluding(root, &[])
    }

    /// Capture the tree rooted at `root`, skipping top-level children named in
    /// `exclude`.
    pub fn capture_excluding(root: &Path, exclude: &[&str]) -> Result<Option<Self>> {
        if fs::symlink_metadata(root).is_err() {
            return Ok(None);
        }

        let mut snapshot = Self::default();
        snapshot.walk(root, PathBuf::new(), exclude)?;
        Ok(Some(snapshot))
    }

    /// Snapshot of a single in-memory file, as it would look once written.
    pub fn of_content(content: &[u8], mode: u32) -> Self {
        let mut snapshot = Self::default();
        snapshot.entries.insert(
            PathBuf::new(),
            TreeEntry {
                kind: EntryKind::File {
                    checksum: compute_content_checksum(content),
                },
                mode,
            },
        );
        snapshot
    }

    /// The snapshot as a git commit records it.
    ///
    /// Directories are dropped, since git tracks only their contents, and
    /// file modes collapse to `0o644` or `0o755` depending on the owner
    /// execute bit. Two trees whose committed forms are equal check out
    /// identically.
    pub fn as_committed(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.kind != EntryKind::Dir)
            .map(|(path, entry)| {
                let mode = match entry.kind {
                    EntryKind::File { .. } if entry.mode & 0o100 != 0 => 0o755,
                    EntryKind::File { .. } => 0o644,
                    _ => entry.mode,
                };
                (
                    path.clone(),
                    TreeEntry {
                        kind: entry.kind.clone(),
                        mode,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Number of entries, including the root.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its path relative to the snapshot root.
    pub fn get(&self, relative: &Path) -> Option<&TreeEntry> {
        self.entries.get(relative)
    }

    /// Iterate over entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &TreeEntry)> {
        self.entries.iter()
    }

    fn walk(&mut self, path: &Path, relative: PathBuf, exclude: &[&str]) -> Result<()> {
        let metadata = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;
        let file_type = metadata.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(|e| Error::io(path, e))?;
            self.entries.insert(
                relative,
                TreeEntry {
                    kind: EntryKind::Symlink { target },
                    mode: 0,
                },
            );
        } else if file_type.is_file() {
            let content = fs::read(path).map_err(|e| Error::io(path, e))?;
            self.entries.insert(
                relative,
                TreeEntry {
                    kind: EntryKind::File {
                        checksum: compute_content_checksum(&content),
                    },
                    mode: permission_bits(&metadata),
                },
            );
        } else if file_type.is_dir() {
            let is_root = relative.as_os_str().is_empty();
            self.entries.insert(
                relative.clone(),
                TreeEntry {
                    kind: EntryKind::Dir,
                    mode: permission_bits(&metadata),
                },
            );
            for entry in fs::read_dir(path).map_err(|e| Error::io(path, e))? {
                let entry = entry.map_err(|e| Error::io(path, e))?;
                let name = entry.file_name();
                if is_root && exclude.iter().any(|x| name == **x) {
                    continue;
                }
                self.walk(&entry.path(), relative.join(&name), &[])?;
            }
        } else {
            return Err(Error::UnsupportedEntry {
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }
}
