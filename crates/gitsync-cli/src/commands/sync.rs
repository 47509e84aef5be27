//! Sync command implementation
//!
//! Loads a manifest, applies command-line overrides and reconciles the
//! configured repository with it.

use colored::Colorize;

use gitsync_core::{
    CommitGranularity, Manifest, ReconciliationEngine, SyncOptions, SyncReport,
};

use crate::cli::SyncArgs;
use crate::error::Result;

/// Run the sync command
pub fn run_sync(args: &SyncArgs) -> Result<()> {
    let manifest = apply_overrides(Manifest::load(&args.config)?, args)?;
    let settings = manifest.repository_settings()?;
    let configuration = manifest.into_configuration()?;

    if !args.json {
        println!(
            "{} Synchronising {} resource(s) into {} ({})",
            "=>".blue().bold(),
            configuration.len(),
            settings.remote.cyan(),
            settings.branch
        );
    }

    let options = SyncOptions {
        dry_run: args.dry_run,
        granularity: if args.per_resource_commits {
            CommitGranularity::PerResource
        } else {
            CommitGranularity::PerKind
        },
        checkout_parent: args.checkout_parent.clone(),
    };

    let engine = ReconciliationEngine::with_git(settings.auth());
    let mut working_copy = settings.working_copy();
    let result = engine.run(&mut working_copy, &configuration, &options)?;
    let report = SyncReport::from(&result);

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report, args.dry_run);
    }

    Ok(())
}

/// Command-line values take precedence over the manifest.
fn apply_overrides(mut manifest: Manifest, args: &SyncArgs) -> Result<Manifest> {
    if let Some(repository) = &args.repository {
        manifest.repository = Some(repository.clone());
    }
    if let Some(branch) = &args.branch {
        manifest.branch = branch.clone();
    }
    if let Some(name) = &args.committer_name {
        manifest.committer_name = Some(name.clone());
    }
    if let Some(email) = &args.committer_email {
        manifest.committer_email = Some(email.clone());
    }
    // Relative to the invocation directory, not the manifest
    if let Some(key_file) = &args.key_file {
        manifest.key_file = Some(std::path::absolute(key_file)?);
    }
    Ok(manifest)
}

fn print_report(report: &SyncReport, dry_run: bool) {
    if !report.changed {
        println!("{} Already synchronized", "OK".green().bold());
        return;
    }

    let groups = [
        ("subrepos", &report.synchronised.subrepos),
        ("files", &report.synchronised.files),
        ("templates", &report.synchronised.templates),
    ];
    for (label, destinations) in groups {
        if destinations.is_empty() {
            continue;
        }
        println!("   {}:", label.bold());
        for destination in destinations {
            println!("     {} {}", "+".green(), destination);
        }
    }

    if dry_run {
        println!(
            "{} Dry run: changes were committed locally and discarded",
            "OK".yellow().bold()
        );
    } else {
        println!("{} Synchronised and pushed", "OK".green().bold());
    }
}
