//! Manifest parsing
//!
//! ```yaml
//! repository: git@example.com:org/target.git
//! branch: master
//! committer_name: Sync Bot
//! committer_email: sync@example.com
//! key_file: /home/sync/.ssh/id_rsa
//! files-directory: ./files
//! files:
//!   - src: start.sh
//!     dest: ci/before_scripts.d/start.sh
//!     overwrite: true
//! templates:
//!   - src: readme.j2
//!     dest: README.md
//!     variables: {project: demo}
//! subrepos:
//!   - src: https://example.com/shared.git
//!     dest: vendor/shared
//!     branch: develop
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gitsync_fs::{ConfigStore, NormalizedPath};
use gitsync_git::{GitCheckout, GitWorkingCopy, Identity, RemoteAuth};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{FileResource, SubrepoResource, SyncConfiguration, TemplateResource};
use crate::{Error, Result};

/// Branch used when a manifest names none.
pub const DEFAULT_BRANCH: &str = "master";

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

/// A file or directory to copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub src: PathBuf,
    pub dest: NormalizedPath,
    #[serde(default)]
    pub overwrite: bool,
}

/// A template to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub src: PathBuf,
    pub dest: NormalizedPath,
    #[serde(default)]
    pub overwrite: bool,
    /// Scalar values; numbers and booleans are rendered as written
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

/// A third-party repository to embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubrepoEntry {
    /// Remote URL
    pub src: String,
    pub dest: NormalizedPath,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
}

/// Parsed manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Remote URL of the repository to manage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer_email: Option<String>,

    /// SSH private key for every remote operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,

    /// Base for relative file and template sources
    #[serde(rename = "files-directory", default, skip_serializing_if = "Option::is_none")]
    pub files_directory: Option<PathBuf>,

    #[serde(default)]
    pub files: Vec<FileEntry>,

    #[serde(default)]
    pub templates: Vec<TemplateEntry>,

    #[serde(default)]
    pub subrepos: Vec<SubrepoEntry>,

    /// Directory relative paths in the manifest are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            repository: None,
            branch: default_branch(),
            committer_name: None,
            committer_email: None,
            key_file: None,
            files_directory: None,
            files: Vec::new(),
            templates: Vec::new(),
            subrepos: Vec::new(),
            base_dir: None,
        }
    }
}

/// Where and as whom to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    pub remote: String,
    pub branch: String,
    pub identity: Option<Identity>,
    pub key_file: Option<PathBuf>,
}

impl RepositorySettings {
    pub fn auth(&self) -> RemoteAuth {
        match &self.key_file {
            Some(key_file) => RemoteAuth::with_key_file(key_file),
            None => RemoteAuth::new(),
        }
    }

    pub fn working_copy(&self) -> GitWorkingCopy {
        let copy = GitWorkingCopy::new(&self.remote, &self.branch).with_auth(self.auth());
        match &self.identity {
            Some(identity) => copy.with_identity(identity.clone()),
            None => copy,
        }
    }
}

impl Manifest {
    /// Load a manifest, resolving relative paths against its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if its
    /// extension is not one of `.toml`, `.json`, `.yaml`, `.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut manifest: Manifest = ConfigStore::new().load(path)?;
        manifest.base_dir = path.parent().map(|dir| {
            if dir.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                dir.to_path_buf()
            }
        });
        tracing::debug!(path = %path.display(), "Loaded manifest");
        Ok(manifest)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn source(&self, src: &Path) -> Result<PathBuf> {
        if src.is_absolute() {
            return Ok(src.to_path_buf());
        }

        let Some(files_directory) = &self.files_directory else {
            return Err(Error::configuration(format!(
                "relative source '{}' requires files-directory",
                src.display()
            )));
        };
        let resolved = self.resolve(files_directory).join(src);

        // Sources must be absolute; anchor a relative base on the cwd
        if resolved.is_absolute() {
            Ok(resolved)
        } else {
            Ok(std::env::current_dir()?.join(resolved))
        }
    }

    /// Build the desired state described by this manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for relative sources without a
    /// `files-directory` and for non-scalar template variables.
    pub fn into_configuration(&self) -> Result<SyncConfiguration> {
        let files = self
            .files
            .iter()
            .map(|entry| {
                Ok(FileResource {
                    source: self.source(&entry.src)?,
                    destination: entry.dest.clone(),
                    overwrite: entry.overwrite,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let templates = self
            .templates
            .iter()
            .map(|entry| {
                Ok(TemplateResource {
                    source: self.source(&entry.src)?,
                    destination: entry.dest.clone(),
                    overwrite: entry.overwrite,
                    variables: variables(&entry.variables)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let subrepos = self
            .subrepos
            .iter()
            .map(|entry| {
                Ok(SubrepoResource {
                    checkout: GitCheckout::new(
                        entry.src.clone(),
                        entry.branch.clone(),
                        entry.dest.clone(),
                        pinned_commit(entry)?,
                    ),
                    overwrite: entry.overwrite,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SyncConfiguration::new(files, templates, subrepos))
    }

    /// Settings for the repository being managed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if no repository is set, or if
    /// only one of the committer name and email is.
    pub fn repository_settings(&self) -> Result<RepositorySettings> {
        let remote = self
            .repository
            .clone()
            .ok_or_else(|| Error::configuration("no repository configured"))?;

        let identity = match (&self.committer_name, &self.committer_email) {
            (Some(name), Some(email)) => Some(Identity::new(name, email)),
            (None, None) => None,
            _ => {
                return Err(Error::configuration(
                    "committer_name and committer_email must be set together",
                ));
            }
        };

        Ok(RepositorySettings {
            remote,
            branch: self.branch.clone(),
            identity,
            key_file: self.key_file.as_deref().map(|key| self.resolve(key)),
        })
    }
}

/// A pinned commit must be a full or abbreviated (at least 4 digit) hex hash.
fn pinned_commit(entry: &SubrepoEntry) -> Result<Option<String>> {
    let Some(commit) = &entry.commit else {
        return Ok(None);
    };
    if (4..=40).contains(&commit.len()) && commit.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(Some(commit.to_ascii_lowercase()))
    } else {
        Err(Error::configuration(format!(
            "subrepo '{}' must pin a commit hash, not '{commit}'",
            entry.dest
        )))
    }
}

fn variables(raw: &BTreeMap<String, Value>) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::configuration(format!(
                        "template variable '{name}' must be a scalar"
                    )));
                }
            };
            Ok((name.clone(), rendered))
        })
        .collect()
}
