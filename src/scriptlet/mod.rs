// src/scriptlet/mod.rs

//! Lifecycle script execution
//!
//! A package may ship `bin/.<name>-<action>.sh` (`Scripts\.<name>-<action>.bat`
//! on Windows). After its files are linked, the `post-link` script runs with
//! `PREFIX` set to the environment prefix. Key points:
//!
//! - A missing script is not an error
//! - stdin is nulled so a script can never block waiting for input
//! - An optional timeout kills scripts that hang

use crate::dist::Dist;
use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use strum_macros::{Display, EnumString};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// When a lifecycle script runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ScriptAction {
    PostLink,
    /// Never run when linking; names the script an uninstaller would run
    PreUnlink,
}

/// Result of asking for a script to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// Package ships no script for this action
    NotPresent,
    /// Script exists but scripts are disabled
    Skipped,
    Succeeded,
    /// Script ran and failed; exit code if it exited normally
    Failed(Option<i32>),
}

impl ScriptOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Runs package lifecycle scripts inside one prefix
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    prefix: PathBuf,
    skip_scripts: bool,
    timeout: Option<Duration>,
}

impl ScriptRunner {
    pub fn new(prefix: &Path) -> Self {
        Self {
            prefix: prefix.to_path_buf(),
            skip_scripts: false,
            timeout: None,
        }
    }

    /// Report scripts as skipped instead of running them
    pub fn with_skip_scripts(mut self, skip: bool) -> Self {
        self.skip_scripts = skip;
        self
    }

    /// Kill scripts that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Location of the script for `dist` and `action`
    pub fn script_path(&self, dist: &Dist, action: ScriptAction) -> PathBuf {
        let (dir, ext) = if cfg!(windows) {
            ("Scripts", "bat")
        } else {
            ("bin", "sh")
        };
        self.prefix
            .join(dir)
            .join(format!(".{}-{}.{}", dist.name(), action, ext))
    }

    /// Run the script for `dist` and `action` if the package ships one
    pub fn run(&self, dist: &Dist, action: ScriptAction) -> Result<ScriptOutcome> {
        let path = self.script_path(dist, action);
        if !path.is_file() {
            debug!("No {} script for {}", action, dist);
            return Ok(ScriptOutcome::NotPresent);
        }
        if self.skip_scripts {
            warn!("skipping {} script by user request", action);
            return Ok(ScriptOutcome::Skipped);
        }

        let Some(mut command) = shell_command(&path) else {
            warn!("COMSPEC is not set, cannot run {}", path.display());
            return Ok(ScriptOutcome::Failed(None));
        };

        info!("Executing {} script for {}", action, dist);
        let mut child = command
            .env("PREFIX", &self.prefix)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| Error::Script(format!("failed to spawn {}: {}", path.display(), e)))?;

        let status = match self.timeout {
            None => child.wait()?,
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Script(format!(
                        "{} script for {} timed out after {} seconds",
                        action,
                        dist,
                        timeout.as_secs()
                    )));
                }
            },
        };

        Ok(outcome_from_status(action, status))
    }
}

fn outcome_from_status(action: ScriptAction, status: ExitStatus) -> ScriptOutcome {
    if status.success() {
        info!("{} script completed successfully", action);
        ScriptOutcome::Succeeded
    } else {
        warn!("{} script failed with {}", action, status);
        ScriptOutcome::Failed(status.code())
    }
}

/// Interpreter invocation for a script on this platform
fn shell_command(script: &Path) -> Option<Command> {
    if cfg!(windows) {
        let comspec = env::var_os("COMSPEC")?;
        let mut command = Command::new(comspec);
        command.arg("/c").arg(script);
        Some(command)
    } else {
        let shell = if cfg!(any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            "/bin/sh"
        } else {
            "/bin/bash"
        };
        let mut command = Command::new(shell);
        command.arg(script);
        Some(command)
    }
}
