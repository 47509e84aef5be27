//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// gitsync - Keep shared files, templates and subrepos in sync across git repositories
#[derive(Parser, Debug)]
#[command(name = "gitsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Reconcile a repository with a manifest, then commit and push
    ///
    /// Examples:
    ///   gitsync sync --config gitsync.yaml
    ///   gitsync sync -c gitsync.toml --dry-run --json
    ///   gitsync sync -c gitsync.yaml --repository git@example.com:org/repo.git --branch main
    Sync(SyncArgs),

    /// Validate a manifest and print the resources it declares
    ///
    /// Does not contact any repository.
    Check {
        /// Manifest file (.toml, .yaml, .yml or .json)
        #[arg(short, long, env = "GITSYNC_CONFIG")]
        config: PathBuf,
    },
}

/// Arguments of `gitsync sync`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SyncArgs {
    /// Manifest file (.toml, .yaml, .yml or .json)
    #[arg(short, long, env = "GITSYNC_CONFIG")]
    pub config: PathBuf,

    /// Repository to synchronise, overriding the manifest
    #[arg(long)]
    pub repository: Option<String>,

    /// Branch to synchronise, overriding the manifest
    #[arg(long)]
    pub branch: Option<String>,

    /// Committer name, overriding the manifest
    #[arg(long)]
    pub committer_name: Option<String>,

    /// Committer email, overriding the manifest
    #[arg(long)]
    pub committer_email: Option<String>,

    /// SSH private key for remote operations, overriding the manifest
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Commit locally but do not push
    #[arg(long)]
    pub dry_run: bool,

    /// Create one commit per changed resource instead of one per kind
    #[arg(long)]
    pub per_resource_commits: bool,

    /// Output as JSON for scripting
    #[arg(long)]
    pub json: bool,

    /// Directory to create the temporary checkout in
    #[arg(long)]
    pub checkout_parent: Option<PathBuf>,
}
