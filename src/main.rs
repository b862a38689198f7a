// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use pkglink::config::{default_root_prefix, parse_force, FORCE_ENV};
use pkglink::{InstallManifest, Installer, LinkConfig};
use std::time::Duration;
use tracing::info;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let root_prefix = cli.root_prefix.unwrap_or_else(default_root_prefix);
    let force = parse_force(std::env::var(FORCE_ENV).ok().as_deref());
    if force {
        info!("using -f (force) option");
    }

    let config = LinkConfig::new(root_prefix)
        .with_force(force)
        .with_skip_scripts(cli.skip_scripts)
        .with_strict_links(cli.strict_links)
        .with_script_timeout(cli.script_timeout.map(Duration::from_secs));

    let manifest = InstallManifest::locate(cli.manifest.as_deref(), &config.pkgs_dir)
        .context("Failed to load install manifest")?;

    let installer = Installer::new(config, manifest);

    if let Some(env_name) = cli.post {
        let dist = installer.post_extract(&env_name)?;
        info!("Post-extract complete for {}", dist);
        return Ok(());
    }

    // An installer carrying no packages has extracted a single one into root
    if installer.manifest().is_empty() {
        let dist = installer.post_extract("root")?;
        info!("Post-extract complete for {}", dist);
        return Ok(());
    }

    let reports = installer.link_environments()?;
    for report in &reports {
        let skipped: usize = report.packages.iter().map(|(_, r)| r.skipped.len()).sum();
        info!(
            "Environment '{}': {} packages linked, {} files skipped, {} records retired",
            report.name,
            report.packages.len(),
            skipped,
            report.retired.len()
        );
    }
    Ok(())
}
