//! Real git repositories driven through the `git` CLI.
//!
//! Every invocation carries its own identity and disables signing, so the
//! fixtures behave the same regardless of the user's global git config.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Once;

use tempfile::TempDir;

/// Identity used for every fixture commit.
pub const TEST_NAME: &str = "Test User";
pub const TEST_EMAIL: &str = "test@test.com";

/// Run `git` in `dir` and return its trimmed stdout.
///
/// # Panics
/// Panics if git cannot be spawned or exits unsuccessfully.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    try_git(dir, args).unwrap_or_else(|stderr| panic!("`git {args:?}` failed in {}:\n{stderr}", dir.display()))
}

/// Run `git` in `dir`, returning trimmed stdout on success and stderr on
/// failure.
pub fn try_git(dir: &Path, args: &[&str]) -> Result<String, String> {
    try_git_raw(dir, args).map(|stdout| stdout.trim().to_string())
}

/// Like [`try_git`], but stdout is returned byte for byte.
pub fn try_git_raw(dir: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args([
            "-c",
            &format!("user.name={TEST_NAME}"),
            "-c",
            &format!("user.email={TEST_EMAIL}"),
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run `git {args:?}`: {e}"));

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).into_owned())
    }
}

/// Write `files` (path, content) below `root`, creating parent directories.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&target, content).unwrap();
    }
}

/// Write one file in an existing worktree, commit everything and return the
/// new commit hash. Nothing is pushed.
pub fn commit_file(worktree: &Path, path: &str, content: &str, message: &str) -> String {
    write_files(worktree, &[(path, content)]);
    run_git(worktree, &["add", "-A"]);
    run_git(worktree, &["commit", "-m", message]);
    run_git(worktree, &["rev-parse", "HEAD"])
}

/// A bare repository standing in for a remote, with a private seed clone used
/// to publish commits to it.
///
/// Realism level: **REAL WITH HISTORY**. The URL is a plain local path, which
/// both git2 and the `git` CLI accept.
pub struct BareRemote {
    _temp: TempDir,
    bare: PathBuf,
    seed: PathBuf,
}

impl Default for BareRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl BareRemote {
    /// An empty bare repository.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let bare = temp.path().join("remote.git");
        let seed = temp.path().join("seed");
        fs::create_dir_all(&bare).unwrap();
        fs::create_dir_all(&seed).unwrap();

        run_git(&bare, &["init", "--bare"]);
        run_git(&seed, &["init"]);
        run_git(&seed, &["remote", "add", "origin", &bare.to_string_lossy()]);

        Self {
            _temp: temp,
            bare,
            seed,
        }
    }

    /// A bare repository whose `branch` holds a single commit with `files`.
    pub fn with_files(branch: &str, files: &[(&str, &str)]) -> Self {
        let remote = Self::new();
        remote.commit_files(branch, files, "Initial commit");
        remote
    }

    /// URL to clone from.
    pub fn url(&self) -> String {
        self.bare.to_string_lossy().into_owned()
    }

    pub fn path(&self) -> &Path {
        &self.bare
    }

    /// Commit `files` on top of `branch` (branching from the seed's current
    /// commit when the branch is new), push it and return the commit hash.
    pub fn commit_files(&self, branch: &str, files: &[(&str, &str)], message: &str) -> String {
        let has_history = try_git(&self.seed, &["rev-parse", "--verify", "HEAD"]).is_ok();
        let branch_exists =
            try_git(&self.seed, &["rev-parse", "--verify", &format!("refs/heads/{branch}")]).is_ok();

        if branch_exists {
            run_git(&self.seed, &["checkout", branch]);
        } else if has_history {
            run_git(&self.seed, &["checkout", "-b", branch]);
        } else {
            run_git(&self.seed, &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")]);
        }

        write_files(&self.seed, files);
        run_git(&self.seed, &["add", "-A"]);
        run_git(&self.seed, &["commit", "--allow-empty", "-m", message]);
        run_git(&self.seed, &["push", "origin", branch]);
        run_git(&self.seed, &["rev-parse", "HEAD"])
    }

    /// Commit hash `branch` points at on the remote.
    pub fn head(&self, branch: &str) -> String {
        run_git(&self.bare, &["rev-parse", &format!("refs/heads/{branch}")])
    }

    /// Content of `path` at the tip of `branch`, if it exists there.
    pub fn read_file(&self, branch: &str, path: &str) -> Option<String> {
        try_git_raw(&self.bare, &["show", &format!("{branch}:{path}")]).ok()
    }

    /// Commit subjects on `branch`, newest first.
    pub fn log(&self, branch: &str) -> Vec<String> {
        run_git(&self.bare, &["log", "--format=%s", branch])
            .lines()
            .map(String::from)
            .collect()
    }

    /// Number of commits reachable from `branch`.
    pub fn commit_count(&self, branch: &str) -> usize {
        self.log(branch).len()
    }
}

/// Initialises a real git repository using `git2` (no initial commit, no config).
///
/// Realism level: **REAL**, valid git object store, empty history.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Point libgit2's global, XDG and system config lookups at an empty
/// directory for the rest of the process, so no `user.name` or `user.email`
/// is visible to git2.
///
/// Search paths are process-wide: only call this from a test binary whose
/// tests all expect the empty config. The `git` CLI used by [`BareRemote`]
/// is unaffected.
///
/// # Panics
/// Panics if the directory cannot be created or libgit2 rejects the path.
pub fn isolate_git_config() {
    static ISOLATED: Once = Once::new();
    ISOLATED.call_once(|| {
        let empty = std::env::temp_dir().join(format!("gitsync-empty-config-{}", std::process::id()));
        fs::create_dir_all(&empty).unwrap();
        for level in [
            git2::ConfigLevel::ProgramData,
            git2::ConfigLevel::System,
            git2::ConfigLevel::XDG,
            git2::ConfigLevel::Global,
        ] {
            // SAFETY: runs once, before the calling test touches libgit2.
            unsafe { git2::opts::set_search_path(level, empty.as_path()) }
                .unwrap_or_else(|e| panic!("isolate_git_config: cannot set search path: {e}"));
        }
    });
}
