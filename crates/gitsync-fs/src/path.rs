//! Normalized path handling for repo-relative destinations

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A path normalized to use forward slashes internally.
///
/// Normalization is purely lexical: backslashes become forward slashes, empty
/// and `.` segments are dropped and `name/..` pairs collapse. A `..` that
/// cannot be collapsed is kept on relative paths so callers can still see that
/// the path climbs out of wherever it is joined onto. On absolute paths it is
/// dropped, since nothing lies above the filesystem root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: clean(&path.as_ref().to_string_lossy()),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path is absolute: `/x`, or on Windows a `C:/x` drive path.
    pub fn is_absolute(&self) -> bool {
        is_absolute_str(&self.inner)
    }

    /// Whether the path denotes "here" (empty, or only `.` segments).
    pub fn is_current_dir(&self) -> bool {
        self.inner == "."
    }

    /// Whether a relative path climbs above its starting point.
    pub fn escapes(&self) -> bool {
        self.segments().any(|s| s == "..")
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
    }

    /// Join this path with a segment, normalizing the result.
    ///
    /// An absolute segment replaces this path, like [`Path::join`].
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if is_absolute_str(&segment) {
            return Self {
                inner: clean(&segment),
            };
        }
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Strip `base` from the front of this path.
    ///
    /// Returns `None` if this path does not lie at or below `base`. When the
    /// paths are equal the result is the current-dir path `.`.
    pub fn strip_prefix(&self, base: &NormalizedPath) -> Option<Self> {
        let mut own = self.segments();
        for expected in base.segments() {
            if own.next() != Some(expected) {
                return None;
            }
        }
        if self.is_absolute() != base.is_absolute() {
            return None;
        }
        let rest: Vec<&str> = own.collect();
        Some(Self::new(rest.join("/")))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last().filter(|s| *s != "..")
    }
}

fn is_absolute_str(s: &str) -> bool {
    s.starts_with('/') || (cfg!(windows) && is_drive_path(s))
}

fn is_drive_path(s: &str) -> bool {
    match s.as_bytes() {
        [letter, b':'] => letter.is_ascii_alphabetic(),
        [letter, b':', b'/', ..] => letter.is_ascii_alphabetic(),
        _ => false,
    }
}

fn clean(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl Serialize for NormalizedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for NormalizedPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(NormalizedPath::new(r"config\ci\start.sh").as_str(), "config/ci/start.sh");
    }

    #[test]
    fn dot_segments_collapse() {
        assert_eq!(NormalizedPath::new("a/./b//c/../d").as_str(), "a/b/d");
        assert_eq!(NormalizedPath::new("./").as_str(), ".");
    }

    #[test]
    fn leading_parent_is_kept_on_relative_paths() {
        let path = NormalizedPath::new("../escape.txt");
        assert_eq!(path.as_str(), "../escape.txt");
        assert!(path.escapes());
    }

    #[test]
    fn parent_is_dropped_at_filesystem_root() {
        assert_eq!(NormalizedPath::new("/../etc").as_str(), "/etc");
    }

    #[test]
    fn join_resolves_dots() {
        let base = NormalizedPath::new("/a/b");
        assert_eq!(base.join("c").as_str(), "/a/b/c");
        assert_eq!(base.join("./c").as_str(), "/a/b/c");
        assert_eq!(base.join("../c").as_str(), "/a/c");
        assert_eq!(base.join("/x/y").as_str(), "/x/y");
    }

    #[test]
    fn strip_prefix_detects_containment() {
        let root = NormalizedPath::new("/work/copy");
        let inside = root.join("sub/file");
        let outside = root.join("../secret");

        assert_eq!(inside.strip_prefix(&root).unwrap().as_str(), "sub/file");
        assert!(outside.strip_prefix(&root).is_none());
        assert!(root.strip_prefix(&root).unwrap().is_current_dir());
    }

    #[test]
    fn strip_prefix_does_not_match_partial_segments() {
        let root = NormalizedPath::new("/work/copy");
        let sibling = NormalizedPath::new("/work/copy-2/file");
        assert!(sibling.strip_prefix(&root).is_none());
    }

    #[test]
    fn file_name_and_parent() {
        let path = NormalizedPath::new("ci/before_scripts.d/start.sh");
        assert_eq!(path.file_name(), Some("start.sh"));
        assert_eq!(path.parent().unwrap().as_str(), "ci/before_scripts.d");
    }

    #[rstest]
    #[case("C:/Users/ci", true)]
    #[case("d:", true)]
    #[case("a:b", false)]
    #[case("1:/x", false)]
    #[case("notes:2024.txt", false)]
    fn drive_paths(#[case] input: &str, #[case] drive: bool) {
        assert_eq!(is_drive_path(input), drive);
    }

    #[test]
    #[cfg(unix)]
    fn colon_names_are_relative_on_unix() {
        let path = NormalizedPath::new("a:b");
        assert!(!path.is_absolute());

        let root = NormalizedPath::new("/tmp/gitsync-abc");
        assert_eq!(root.join(path.as_str()).as_str(), "/tmp/gitsync-abc/a:b");
    }
}
