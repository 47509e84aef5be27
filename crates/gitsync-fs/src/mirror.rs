//! Mirror copying
//!
//! A mirror makes the target an exact structural copy of the source: content,
//! directory layout, permission bits and symlink targets, with target entries
//! that have no counterpart in the source removed. Only entries that actually
//! differ are touched, so mirroring an already identical tree writes nothing.

use std::fs::{self, Permissions};
use std::path::Path;

use crate::io::{remove_path, write_atomic};
use crate::{Error, Result};

/// Mirror `source` onto `target`.
///
/// Top-level children of a directory named in `exclude` are ignored on both
/// sides: they are neither copied from the source nor removed from the target.
///
/// Returns whether anything under `target` was modified.
pub fn mirror_tree(source: &Path, target: &Path, exclude: &[&str]) -> Result<bool> {
    mirror_entry(source, target, exclude)
}

/// Write `content` to `target` with the given permissions, unless the target
/// already holds exactly that.
///
/// Returns whether the target was modified.
pub fn write_file(content: &[u8], permissions: &Permissions, target: &Path) -> Result<bool> {
    if let Ok(metadata) = fs::symlink_metadata(target)
        && metadata.is_file()
    {
        let existing = fs::read(target).map_err(|e| Error::io(target, e))?;
        if existing == content && same_permissions(&metadata.permissions(), permissions) {
            return Ok(false);
        }
    } else if fs::symlink_metadata(target).is_ok() {
        remove_path(target)?;
    }

    write_atomic(target, content, Some(permissions))?;
    Ok(true)
}

fn mirror_entry(source: &Path, target: &Path, exclude: &[&str]) -> Result<bool> {
    let metadata = fs::symlink_metadata(source).map_err(|e| Error::io(source, e))?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        mirror_symlink(source, target)
    } else if file_type.is_file() {
        let content = fs::read(source).map_err(|e| Error::io(source, e))?;
        write_file(&content, &metadata.permissions(), target)
    } else if file_type.is_dir() {
        mirror_dir(source, target, &metadata.permissions(), exclude)
    } else {
        Err(Error::UnsupportedEntry {
            path: source.to_path_buf(),
        })
    }
}

fn mirror_dir(
    source: &Path,
    target: &Path,
    permissions: &Permissions,
    exclude: &[&str],
) -> Result<bool> {
    let mut changed = false;

    match fs::symlink_metadata(target) {
        Ok(existing) if existing.is_dir() => {}
        Ok(_) => {
            remove_path(target)?;
            fs::create_dir_all(target).map_err(|e| Error::io(target, e))?;
            changed = true;
        }
        Err(_) => {
            fs::create_dir_all(target).map_err(|e| Error::io(target, e))?;
            changed = true;
        }
    }

    let mut source_names = Vec::new();
    for entry in fs::read_dir(source).map_err(|e| Error::io(source, e))? {
        let entry = entry.map_err(|e| Error::io(source, e))?;
        let name = entry.file_name();
        if exclude.iter().any(|x| name == **x) {
            continue;
        }
        changed |= mirror_entry(&entry.path(), &target.join(&name), &[])?;
        source_names.push(name);
    }

    for entry in fs::read_dir(target).map_err(|e| Error::io(target, e))? {
        let entry = entry.map_err(|e| Error::io(target, e))?;
        let name = entry.file_name();
        if exclude.iter().any(|x| name == **x) || source_names.contains(&name) {
            continue;
        }
        tracing::debug!(path = %entry.path().display(), "Removing extraneous entry");
        remove_path(&entry.path())?;
        changed = true;
    }

    let current = fs::metadata(target).map_err(|e| Error::io(target, e))?;
    if !same_permissions(&current.permissions(), permissions) {
        fs::set_permissions(target, permissions.clone()).map_err(|e| Error::io(target, e))?;
        changed = true;
    }

    Ok(changed)
}

fn mirror_symlink(source: &Path, target: &Path) -> Result<bool> {
    let link = fs::read_link(source).map_err(|e| Error::io(source, e))?;

    if let Ok(existing) = fs::symlink_metadata(target) {
        if existing.file_type().is_symlink()
            && fs::read_link(target).map_err(|e| Error::io(target, e))? == link
        {
            return Ok(false);
        }
        remove_path(target)?;
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    create_symlink(&link, target)?;
    Ok(true)
}

#[cfg(unix)]
fn create_symlink(link: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link, target).map_err(|e| Error::io(target, e))
}

#[cfg(not(unix))]
fn create_symlink(_link: &Path, target: &Path) -> Result<()> {
    Err(Error::UnsupportedEntry {
        path: target.to_path_buf(),
    })
}

fn same_permissions(a: &Permissions, b: &Permissions) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        a.mode() & 0o7777 == b.mode() & 0o7777
    }
    #[cfg(not(unix))]
    {
        a.readonly() == b.readonly()
    }
}
