// src/cli.rs
//! CLI definitions for pkglink
//!
//! The actual work happens in the library; `main` only turns these options
//! into a [`pkglink::LinkConfig`].

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pkglink")]
#[command(author = "pkglink Contributors")]
#[command(version)]
#[command(about = "Link tool used by installers to populate environments from the package cache", long_about = None)]
pub struct Cli {
    /// Root prefix (defaults to two levels above this executable)
    #[arg(long, value_name = "PATH")]
    pub root_prefix: Option<PathBuf>,

    /// Perform post extract (on a single package) in environment NAME
    #[arg(long, value_name = "NAME")]
    pub post: Option<String>,

    /// Skip running post-link scripts
    #[arg(long)]
    pub skip_scripts: bool,

    /// Install manifest (defaults to <root>/pkgs/install-manifest.toml)
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Fail a package if any of its files could not be linked
    #[arg(long)]
    pub strict_links: bool,

    /// Kill post-link scripts running longer than SECS seconds
    #[arg(long, value_name = "SECS")]
    pub script_timeout: Option<u64>,
}
