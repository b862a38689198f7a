// src/filesystem/retry.rs

//! Writing files that may be transiently locked
//!
//! On Windows, virus scanners briefly hold freshly created files open, so a
//! write right after linking can fail with a permission error. Writes go
//! through [`write_with_retry`], which asks a [`Backoff`] strategy how long to
//! wait before the next attempt.

use crate::error::{Error, Result};
use std::fmt::Debug;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Retry policy for lock-contended writes
pub trait Backoff: Debug + Send + Sync {
    /// Delay before retrying after failed attempt number `attempt` (0-based),
    /// or `None` when no attempts remain.
    fn delay(&self, attempt: u32) -> Option<Duration>;

    /// Total number of attempts this policy allows
    fn max_tries(&self) -> u32;
}

/// Doubling delays starting at `base`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub max_tries: u32,
    pub base: Duration,
}

impl Default for ExponentialBackoff {
    /// Six attempts, 0.1s doubling: about 6.4 seconds in total
    fn default() -> Self {
        Self {
            max_tries: 6,
            base: Duration::from_millis(100),
        }
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_tries {
            return None;
        }
        Some(self.base * 2u32.saturating_pow(attempt))
    }

    fn max_tries(&self) -> u32 {
        self.max_tries
    }
}

/// Single attempt, no waiting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl Backoff for NoRetry {
    fn delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn max_tries(&self) -> u32 {
        1
    }
}

/// Policy for the current platform: retry on Windows only
pub fn platform_backoff() -> Box<dyn Backoff> {
    if cfg!(windows) {
        Box::new(ExponentialBackoff::default())
    } else {
        Box::new(NoRetry)
    }
}

/// Write `data` to `path`, retrying permission errors per `backoff`
pub fn write_with_retry(path: &Path, data: &[u8], backoff: &dyn Backoff) -> Result<()> {
    retry_with_backoff(path, backoff, || fs::write(path, data))
}

/// Run `op` until it succeeds, retrying permission errors per `backoff`
///
/// Any other error is returned at once. When a retrying policy runs out of
/// attempts the result is [`Error::RetriesExhausted`] for `path`.
pub fn retry_with_backoff<T>(
    path: &Path,
    backoff: &dyn Backoff,
    mut op: impl FnMut() -> io::Result<T>,
) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => match backoff.delay(attempt) {
                Some(delay) => {
                    debug!(
                        "Access to {} denied (attempt {}), retrying in {:?}",
                        path.display(),
                        attempt + 1,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                None if backoff.max_tries() > 1 => {
                    return Err(Error::RetriesExhausted {
                        path: path.to_path_buf(),
                        max_tries: backoff.max_tries(),
                    });
                }
                None => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        }
    }
}
