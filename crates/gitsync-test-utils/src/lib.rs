//! Shared test utilities for the gitsync workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: real git repositories driven through the `git` CLI
//! - [`workspace`]: [`TestWorkspace`](workspace::TestWorkspace) builder for
//!   source files and manifests

pub mod git;
pub mod workspace;
