//! Identity of a checked-out git repository

use std::fmt;

use gitsync_fs::NormalizedPath;

/// A git repository checked out at a directory, optionally pinned to a commit.
///
/// Equality is structural over all four fields, so a checkout pinned to a
/// commit never equals the same checkout without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GitCheckout {
    /// Remote URL the checkout was cloned from
    pub url: String,

    /// Branch the checkout tracks
    pub branch: String,

    /// Location, relative to the working copy root
    pub directory: NormalizedPath,

    /// Commit hash, if known or required. Recorded checkouts always carry
    /// the full hash; a desired one may be abbreviated.
    pub commit: Option<String>,
}

impl GitCheckout {
    pub fn new(
        url: impl Into<String>,
        branch: impl Into<String>,
        directory: impl Into<NormalizedPath>,
        commit: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            directory: directory.into(),
            commit,
        }
    }

    /// Same checkout, pinned to `commit`.
    pub fn at_commit(&self, commit: impl Into<String>) -> Self {
        Self {
            commit: Some(commit.into()),
            ..self.clone()
        }
    }

    /// Whether `other` tracks the same remote branch at the same location,
    /// regardless of commit.
    pub fn same_origin(&self, other: &GitCheckout) -> bool {
        self.url == other.url && self.branch == other.branch && self.directory == other.directory
    }

    /// Whether this recorded checkout is what `desired` asks for: same origin,
    /// and a commit that `desired`'s commit equals or abbreviates.
    pub fn satisfies(&self, desired: &GitCheckout) -> bool {
        self.same_origin(desired)
            && match (&self.commit, &desired.commit) {
                (Some(current), Some(wanted)) => commit_matches(current, wanted),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Whether the full hash `commit` is `wanted` or starts with it,
/// ignoring case.
pub fn commit_matches(commit: &str, wanted: &str) -> bool {
    !wanted.is_empty()
        && commit
            .get(..wanted.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(wanted))
}

impl fmt::Display for GitCheckout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} at {}", self.url, self.branch, self.directory)?;
        if let Some(commit) = &self.commit {
            write!(f, " ({commit})")?;
        }
        Ok(())
    }
}
