//! Manifest-driven reconciliation across the whole stack
//!
//! Each test writes a manifest to disk, loads it the way the CLI does and
//! runs the engine against real bare remotes.

use std::path::PathBuf;

use gitsync_core::{Manifest, ReconciliationEngine, SyncOptions, SynchronizationResult};
use gitsync_git::{EmbeddedSubrepoStore, GitWorkingCopy, RemoteAuth, SubrepoStore, WorkingCopy};
use gitsync_fs::NormalizedPath;
use gitsync_test_utils::git::{BareRemote, TEST_EMAIL, TEST_NAME, run_git};
use gitsync_test_utils::workspace::TestWorkspace;
use pretty_assertions::assert_eq;

struct Fixture {
    target: BareRemote,
    upstream: BareRemote,
    sources: TestWorkspace,
    manifest: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let target = BareRemote::with_files("main", &[("README.md", "local readme\n")]);
        let upstream = BareRemote::with_files("stable", &[("lib.txt", "v1\n")]);
        let sources = TestWorkspace::new();
        sources.write("shared/README.md", "shared readme\n");
        sources.write("shared/ci/start.sh", "#!/bin/sh\n");
        sources.write("shared/ci/stop.sh", "#!/bin/sh\n");
        sources.write("shared/version.tpl", "project={{project}} v{{ version }}\n");

        let manifest = sources.write_manifest(
            "gitsync.toml",
            &format!(
                r#"repository = "{target}"
branch = "main"
committer_name = "{TEST_NAME}"
committer_email = "{TEST_EMAIL}"
files-directory = "shared"

[[files]]
src = "README.md"
dest = "README.md"
overwrite = false

[[files]]
src = "ci"
dest = "ci/before_scripts.d"
overwrite = true

[[templates]]
src = "version.tpl"
dest = "VERSION"
overwrite = true

[templates.variables]
project = "demo"
version = 3

[[subrepos]]
src = "{upstream}"
dest = "vendor/lib"
branch = "stable"
overwrite = true
"#,
                target = target.url(),
                upstream = upstream.url(),
            ),
        );

        Self {
            target,
            upstream,
            sources,
            manifest,
        }
    }

    /// Pin the subrepo to `commit` in the manifest.
    fn pin_subrepo(&self, commit: &str) {
        let manifest = std::fs::read_to_string(&self.manifest).unwrap();
        let pinned = manifest.replace(
            "branch = \"stable\"\n",
            &format!("branch = \"stable\"\ncommit = \"{commit}\"\n"),
        );
        std::fs::write(&self.manifest, pinned).unwrap();
    }

    fn sync(&self) -> SynchronizationResult {
        let manifest = Manifest::load(&self.manifest).unwrap();
        let settings = manifest.repository_settings().unwrap();
        let configuration = manifest.into_configuration().unwrap();

        ReconciliationEngine::with_git(settings.auth())
            .run(&mut settings.working_copy(), &configuration, &SyncOptions::default())
            .unwrap()
    }
}

#[test]
fn first_run_commits_each_kind_in_order() {
    let fixture = Fixture::new();

    let result = fixture.sync();

    assert_eq!(result.subrepos().len(), 1);
    assert_eq!(result.files().len(), 1);
    assert_eq!(result.templates().len(), 1);
    let log = fixture.target.log("main");
    assert_eq!(
        log[..3],
        [
            "Synchronised 1 templates.",
            "Synchronised 1 files.",
            "Synchronised 1 subrepos.",
        ]
    );

    let target = &fixture.target;
    assert_eq!(target.read_file("main", "README.md").as_deref(), Some("local readme\n"));
    assert_eq!(
        target.read_file("main", "ci/before_scripts.d/stop.sh").as_deref(),
        Some("#!/bin/sh\n")
    );
    assert_eq!(target.read_file("main", "VERSION").as_deref(), Some("project=demo v3\n"));
    assert_eq!(target.read_file("main", "vendor/lib/lib.txt").as_deref(), Some("v1\n"));

    let gitrepo = target.read_file("main", "vendor/lib/.gitrepo").unwrap();
    assert!(gitrepo.contains(&fixture.upstream.head("stable")), "{gitrepo}");
}

#[test]
fn rerun_without_upstream_changes_is_a_noop() {
    let fixture = Fixture::new();
    fixture.sync();
    let head = fixture.target.head("main");

    let result = fixture.sync();

    assert!(!result.changed());
    assert_eq!(fixture.target.head("main"), head);
}

#[test]
fn upstream_and_source_edits_are_picked_up() {
    let fixture = Fixture::new();
    fixture.sync();
    fixture
        .upstream
        .commit_files("stable", &[("lib.txt", "v2\n")], "Bump");
    fixture.sources.write("shared/version.tpl", "project={{project}}\n");

    let result = fixture.sync();

    assert_eq!(result.subrepos().len(), 1);
    assert!(result.files().is_empty());
    assert_eq!(result.templates().len(), 1);
    assert_eq!(
        fixture.target.read_file("main", "vendor/lib/lib.txt").as_deref(),
        Some("v2\n")
    );
    assert_eq!(
        fixture.target.read_file("main", "VERSION").as_deref(),
        Some("project=demo\n")
    );
}

#[test]
fn removed_source_file_disappears_from_mirrored_directory() {
    let fixture = Fixture::new();
    fixture.sync();
    std::fs::remove_file(fixture.sources.path("shared/ci/stop.sh")).unwrap();

    let result = fixture.sync();

    assert_eq!(result.files().len(), 1);
    assert_eq!(fixture.target.read_file("main", "ci/before_scripts.d/stop.sh"), None);
    assert!(fixture.target.read_file("main", "ci/before_scripts.d/start.sh").is_some());
}

#[test]
fn embedded_subrepo_state_survives_a_fresh_checkout() {
    let fixture = Fixture::new();
    fixture.sync();

    let mut copy = GitWorkingCopy::new(fixture.target.url(), "main");
    let root = copy.checkout(None).unwrap();
    let status = EmbeddedSubrepoStore::new(RemoteAuth::new())
        .status(&root, &NormalizedPath::new("vendor/lib"))
        .unwrap()
        .unwrap();
    copy.teardown().unwrap();

    assert_eq!(status.url, fixture.upstream.url());
    assert_eq!(status.branch, "stable");
    assert_eq!(status.commit, Some(fixture.upstream.head("stable")));
}

#[test]
fn empty_source_directory_does_not_resync() {
    let fixture = Fixture::new();
    fixture.sources.mkdir("shared/ci/empty/nested");
    fixture.sync();
    let head = fixture.target.head("main");

    let result = fixture.sync();

    assert!(!result.changed(), "{:?}", result.files());
    assert_eq!(fixture.target.head("main"), head);
}

#[test]
#[cfg(unix)]
fn modes_git_does_not_record_do_not_resync() {
    let fixture = Fixture::new();
    fixture.sources.chmod("shared/ci/start.sh", 0o600);
    fixture.sources.chmod("shared/version.tpl", 0o640);
    fixture.sync();
    let head = fixture.target.head("main");

    let result = fixture.sync();

    assert!(!result.changed(), "{:?} {:?}", result.files(), result.templates());
    assert_eq!(fixture.target.head("main"), head);
}

#[test]
#[cfg(unix)]
fn execute_bit_reaches_the_remote() {
    let fixture = Fixture::new();
    fixture.sync();
    fixture.sources.chmod("shared/ci/start.sh", 0o755);

    let result = fixture.sync();

    assert_eq!(result.files().len(), 1);
    let mode = run_git(
        fixture.target.path(),
        &["ls-tree", "main", "ci/before_scripts.d/start.sh"],
    );
    assert!(mode.starts_with("100755"), "{mode}");
}

#[test]
fn abbreviated_pin_is_cloned_once() {
    let fixture = Fixture::new();
    let pinned = fixture.upstream.head("stable");
    fixture
        .upstream
        .commit_files("stable", &[("lib.txt", "v2\n")], "Bump");
    fixture.pin_subrepo(&pinned[..12].to_uppercase());

    let first = fixture.sync();
    let head = fixture.target.head("main");
    let second = fixture.sync();

    assert_eq!(first.subrepos().len(), 1);
    assert_eq!(
        fixture.target.read_file("main", "vendor/lib/lib.txt").as_deref(),
        Some("v1\n")
    );
    assert!(!second.changed(), "{:?}", second.subrepos());
    assert_eq!(fixture.target.head("main"), head);
}
