//! Check command implementation
//!
//! Validates a manifest without touching any repository.

use std::path::Path;

use colored::Colorize;

use gitsync_core::{Manifest, SyncConfiguration, validate_destination};
use gitsync_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Stand-in checkout root for destination checks.
const PROBE_ROOT: &str = "/gitsync-checkout";

/// Run the check command
pub fn run_check(config: &Path) -> Result<()> {
    println!(
        "{} Checking {}...",
        "=>".blue().bold(),
        config.display()
    );

    let manifest = Manifest::load(config)?;
    let configuration = manifest.into_configuration()?;

    match &manifest.repository {
        Some(repository) => println!("   repository: {} ({})", repository.cyan(), manifest.branch),
        None => println!("   repository: {}", "(not set)".yellow()),
    }
    if manifest.repository.is_some() {
        manifest.repository_settings()?;
    }

    let problems = problems(&configuration);
    print_resources(&configuration, &problems);

    if problems.is_empty() {
        println!("{} Manifest is valid", "OK".green().bold());
        Ok(())
    } else {
        for (destination, problem) in &problems {
            println!("   {} {}: {}", "x".red(), destination, problem);
        }
        Err(CliError::user(format!(
            "{} problem(s) found in {}",
            problems.len(),
            config.display()
        )))
    }
}

/// Destinations that would fail at sync time, with the reason.
fn problems(configuration: &SyncConfiguration) -> Vec<(String, String)> {
    let root = Path::new(PROBE_ROOT);
    let mut problems = Vec::new();

    let mut check_destination = |destination: &NormalizedPath| {
        if let Err(e) = validate_destination(destination, root) {
            problems.push((destination.to_string(), e.to_string()));
        }
    };
    for file in configuration.files() {
        check_destination(&file.destination);
    }
    for template in configuration.templates() {
        check_destination(&template.destination);
    }
    for subrepo in configuration.subrepos() {
        check_destination(&subrepo.checkout.directory);
    }

    let sources = configuration
        .files()
        .iter()
        .map(|r| (&r.destination, &r.source))
        .chain(configuration.templates().iter().map(|r| (&r.destination, &r.source)));
    for (destination, source) in sources {
        if !source.exists() {
            problems.push((
                destination.to_string(),
                format!("source not found: {}", source.display()),
            ));
        }
    }

    problems
}

fn print_resources(configuration: &SyncConfiguration, problems: &[(String, String)]) {
    let marker = |destination: &str| {
        if problems.iter().any(|(d, _)| d == destination) {
            "!".red().to_string()
        } else {
            "-".dimmed().to_string()
        }
    };

    if !configuration.subrepos().is_empty() {
        println!("   {}:", "subrepos".bold());
        for subrepo in configuration.subrepos() {
            let directory = subrepo.checkout.directory.to_string();
            println!(
                "     {} {} <- {}#{}",
                marker(&directory),
                directory,
                subrepo.checkout.url,
                subrepo.checkout.branch
            );
        }
    }
    if !configuration.files().is_empty() {
        println!("   {}:", "files".bold());
        for file in configuration.files() {
            let destination = file.destination.to_string();
            println!(
                "     {} {} <- {}",
                marker(&destination),
                destination,
                file.source.display()
            );
        }
    }
    if !configuration.templates().is_empty() {
        println!("   {}:", "templates".bold());
        for template in configuration.templates() {
            let destination = template.destination.to_string();
            println!(
                "     {} {} <- {} ({} variable(s))",
                marker(&destination),
                destination,
                template.source.display(),
                template.variables.len()
            );
        }
    }
}
