//! Desired state, configuration and run results

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use gitsync_fs::NormalizedPath;
use gitsync_git::GitCheckout;

/// A file or directory copied verbatim into the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    /// Absolute path of the source file or directory
    pub source: PathBuf,
    /// Repository-relative destination
    pub destination: NormalizedPath,
    /// Whether an existing, differing destination may be replaced
    pub overwrite: bool,
}

/// A template rendered into a single file in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResource {
    /// Absolute path of the template file
    pub source: PathBuf,
    /// Repository-relative destination
    pub destination: NormalizedPath,
    /// Whether an existing, differing destination may be replaced
    pub overwrite: bool,
    /// Variables visible to the template, all as strings
    pub variables: BTreeMap<String, String>,
}

/// A third-party repository embedded in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubrepoResource {
    /// Desired checkout; `commit = None` tracks the branch head
    pub checkout: GitCheckout,
    /// Whether a diverging subrepo may be updated or replaced
    pub overwrite: bool,
}

/// Kinds of resource, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Subrepo,
    File,
    Template,
}

impl ResourceKind {
    /// Order in which kinds are reconciled.
    pub const ORDER: [ResourceKind; 3] = [Self::Subrepo, Self::File, Self::Template];

    /// Plural label used in reports and commit messages.
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Subrepo => "subrepos",
            Self::File => "files",
            Self::Template => "templates",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subrepo => "subrepo",
            Self::File => "file",
            Self::Template => "template",
        };
        f.write_str(name)
    }
}

/// One unit of desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredResource {
    File(FileResource),
    Template(TemplateResource),
    Subrepo(SubrepoResource),
}

impl DesiredResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::File(_) => ResourceKind::File,
            Self::Template(_) => ResourceKind::Template,
            Self::Subrepo(_) => ResourceKind::Subrepo,
        }
    }

    /// Repository-relative location this resource converges.
    pub fn destination(&self) -> &NormalizedPath {
        match self {
            Self::File(r) => &r.destination,
            Self::Template(r) => &r.destination,
            Self::Subrepo(r) => &r.checkout.directory,
        }
    }

    /// Human-readable origin of the resource.
    pub fn origin(&self) -> String {
        match self {
            Self::File(r) => r.source.display().to_string(),
            Self::Template(r) => r.source.display().to_string(),
            Self::Subrepo(r) => format!("{}#{}", r.checkout.url, r.checkout.branch),
        }
    }

    /// Commit message used when this resource is committed on its own.
    pub fn commit_message(&self) -> String {
        format!("Synchronised {}.", self.origin())
    }
}

impl From<FileResource> for DesiredResource {
    fn from(resource: FileResource) -> Self {
        Self::File(resource)
    }
}

impl From<TemplateResource> for DesiredResource {
    fn from(resource: TemplateResource) -> Self {
        Self::Template(resource)
    }
}

impl From<SubrepoResource> for DesiredResource {
    fn from(resource: SubrepoResource) -> Self {
        Self::Subrepo(resource)
    }
}

/// Everything a run should converge, grouped by kind in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncConfiguration {
    files: Vec<FileResource>,
    templates: Vec<TemplateResource>,
    subrepos: Vec<SubrepoResource>,
}

impl SyncConfiguration {
    pub fn new(
        files: Vec<FileResource>,
        templates: Vec<TemplateResource>,
        subrepos: Vec<SubrepoResource>,
    ) -> Self {
        Self {
            files,
            templates,
            subrepos,
        }
    }

    pub fn files(&self) -> &[FileResource] {
        &self.files
    }

    pub fn templates(&self) -> &[TemplateResource] {
        &self.templates
    }

    pub fn subrepos(&self) -> &[SubrepoResource] {
        &self.subrepos
    }

    /// Resources of one kind, in configuration order.
    pub fn resources(&self, kind: ResourceKind) -> Vec<DesiredResource> {
        match kind {
            ResourceKind::File => self.files.iter().cloned().map(Into::into).collect(),
            ResourceKind::Template => self.templates.iter().cloned().map(Into::into).collect(),
            ResourceKind::Subrepo => self.subrepos.iter().cloned().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.templates.len() + self.subrepos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resources actually changed by a run, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynchronizationResult {
    files: Vec<FileResource>,
    templates: Vec<TemplateResource>,
    subrepos: Vec<SubrepoResource>,
}

impl SynchronizationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resource whose working-copy state was mutated.
    pub fn record(&mut self, resource: DesiredResource) {
        match resource {
            DesiredResource::File(r) => self.files.push(r),
            DesiredResource::Template(r) => self.templates.push(r),
            DesiredResource::Subrepo(r) => self.subrepos.push(r),
        }
    }

    pub fn files(&self) -> &[FileResource] {
        &self.files
    }

    pub fn templates(&self) -> &[TemplateResource] {
        &self.templates
    }

    pub fn subrepos(&self) -> &[SubrepoResource] {
        &self.subrepos
    }

    pub fn total_count(&self) -> usize {
        self.files.len() + self.templates.len() + self.subrepos.len()
    }

    pub fn changed(&self) -> bool {
        self.total_count() > 0
    }
}
