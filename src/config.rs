// src/config.rs

//! Link configuration
//!
//! Everything the linker needs to know about the run: where the root prefix
//! and the package cache live, and how strictly to behave.

use crate::filesystem::{platform_backoff, Backoff};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable enabling force mode (integer, non-zero means on)
pub const FORCE_ENV: &str = "FORCE";

/// Installer identity written to records when the manifest names none
pub const DEFAULT_INSTALLED_BY: &str = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

/// Configuration for a linking run
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Root environment prefix, e.g. /opt/anaconda
    pub root_prefix: PathBuf,
    /// Package cache, always `<root_prefix>/pkgs`
    pub pkgs_dir: PathBuf,
    /// Replace files already present in the prefix
    pub force: bool,
    /// Do not run lifecycle scripts
    pub skip_scripts: bool,
    /// Fail a package when any of its files could not be placed
    pub strict_links: bool,
    /// Upper bound on lifecycle script runtime
    pub script_timeout: Option<Duration>,
    /// Retry policy for rewriting locked files
    pub backoff: Arc<dyn Backoff>,
}

impl LinkConfig {
    /// Defaults for a root prefix
    pub fn new(root_prefix: impl Into<PathBuf>) -> Self {
        let root_prefix = root_prefix.into();
        let pkgs_dir = root_prefix.join("pkgs");
        Self {
            root_prefix,
            pkgs_dir,
            force: false,
            skip_scripts: false,
            strict_links: false,
            script_timeout: None,
            backoff: Arc::from(platform_backoff()),
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_skip_scripts(mut self, skip: bool) -> Self {
        self.skip_scripts = skip;
        self
    }

    pub fn with_strict_links(mut self, strict: bool) -> Self {
        self.strict_links = strict;
        self
    }

    pub fn with_script_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.script_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Prefix of a named environment: the root prefix for `root`,
    /// `<root>/envs/<name>` otherwise
    pub fn prefix_env(&self, env_name: &str) -> PathBuf {
        if env_name == "root" {
            self.root_prefix.clone()
        } else {
            self.root_prefix.join("envs").join(env_name)
        }
    }
}

/// Interpret a `FORCE` value: an integer, non-zero enables force
pub fn parse_force(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|n| n != 0)
}

/// Default root prefix: two levels above the running executable
///
/// The installer places this tool at `<root>/pkgs/`, so the root is the
/// parent of the executable's directory.
pub fn default_root_prefix() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(Path::parent).map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
