//! Reconciliation engine for gitsync
//!
//! This crate turns a declared set of resources into commits on a git
//! repository:
//!
//! - **Model**: files, templates and embedded subrepos the repository should hold
//! - **Path safety**: destinations are confined to the working copy
//! - **Convergence**: per-kind comparison of current and desired state
//! - **ReconciliationEngine**: checkout, converge, commit, push, teardown
//! - **Manifest**: the on-disk configuration format
//!
//! # Architecture
//!
//! `gitsync-core` sits above the Layer 0 crates and below the CLI:
//!
//! ```text
//!            gitsync-cli
//!                 |
//!           gitsync-core
//!                 |
//!       +---------+---------+
//!       |                   |
//!   gitsync-fs         gitsync-git
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gitsync_core::{Manifest, ReconciliationEngine, SyncOptions, SyncReport};
//!
//! fn example() -> gitsync_core::Result<()> {
//!     let manifest = Manifest::load(Path::new("gitsync.yaml"))?;
//!     let settings = manifest.repository_settings()?;
//!     let engine = ReconciliationEngine::with_git(settings.auth());
//!
//!     let result = engine.run(
//!         &mut settings.working_copy(),
//!         &manifest.into_configuration()?,
//!         &SyncOptions::default(),
//!     )?;
//!     println!("{:?}", SyncReport::from(&result));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod convergence;
pub mod engine;
pub mod error;
pub mod executor;
pub mod model;
pub mod render;
pub mod report;
pub mod safety;

pub use config::{Manifest, RepositorySettings};
pub use convergence::{Convergence, Outcome};
pub use engine::{CommitGranularity, ReconciliationEngine, SyncOptions};
pub use error::{Error, Result};
pub use executor::{ConvergenceExecutor, ExecutionReport, NativeExecutor};
pub use model::{
    DesiredResource, FileResource, ResourceKind, SubrepoResource, SyncConfiguration,
    SynchronizationResult, TemplateResource,
};
pub use render::{JinjaRenderer, TemplateRenderer};
pub use report::{SyncReport, Synchronised};
pub use safety::validate_destination;

pub use gitsync_git::GitCheckout;
