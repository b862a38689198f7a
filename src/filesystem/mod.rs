// src/filesystem/mod.rs

//! Filesystem operations for linking packages
//!
//! This module provides:
//! - File placement from the package cache (hardlink, copy, symlink)
//! - Best-effort removal and safe prefix-relative path handling
//! - Writes that retry while a file is transiently locked

mod placement;
pub mod retry;

pub use placement::{
    detect_link_type, lexists, package_relative, place_file, rm_rf, target_path, LinkType,
};
pub use retry::{
    platform_backoff, retry_with_backoff, write_with_retry, Backoff, ExponentialBackoff, NoRetry,
};
