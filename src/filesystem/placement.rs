// src/filesystem/placement.rs

//! File placement from the package cache into a prefix
//!
//! Files are hardlinked from the cache when the cache and the prefix share a
//! filesystem, which costs no disk space and no content I/O. Files that get
//! rewritten in place must be copied instead, otherwise the rewrite would also
//! change the cached original.

use crate::error::{Error, Result};
use filetime::FileTime;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use strum_macros::{Display, EnumString};
use tracing::{debug, info, warn};

/// How a file is materialized in the prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum LinkType {
    #[strum(serialize = "hard-link")]
    #[serde(rename = "hard-link")]
    HardLink,
    /// Never chosen when installing; kept for record compatibility
    #[strum(serialize = "soft-link")]
    #[serde(rename = "soft-link")]
    SoftLink,
    #[strum(serialize = "copy")]
    #[serde(rename = "copy")]
    Copy,
}

/// Place `src` at `dst` using the given strategy
///
/// `dst` must not exist. Errors are the raw OS errors so callers can decide
/// whether a single failed file is fatal.
pub fn place_file(src: &Path, dst: &Path, link_type: LinkType) -> io::Result<()> {
    match link_type {
        LinkType::HardLink => fs::hard_link(src, dst),
        LinkType::SoftLink => symlink(src, dst),
        LinkType::Copy => copy_file(src, dst),
    }
}

/// Copy a file, recreating relative symlinks as symlinks
///
/// Absolute symlinks are dereferenced: the prefix gets a regular file with the
/// target's content, since the absolute target may not exist once the cache
/// is gone.
fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(src)?;
    if meta.file_type().is_symlink() {
        let target = fs::read_link(src)?;
        if !target.has_root() {
            return symlink(&target, dst);
        }
    }

    // fs::copy follows symlinks and carries permission bits over
    fs::copy(src, dst)?;

    let meta = fs::metadata(src)?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, atime, mtime)?;
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Symlinks not supported on this platform",
    ))
}

/// Whether anything (including a dangling symlink) exists at `path`
pub fn lexists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Remove a file, symlink or directory tree, ignoring every failure
pub fn rm_rf(path: &Path) {
    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(_) => return,
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    if let Err(e) = result {
        debug!("Could not remove {}: {}", path.display(), e);
    }
}

/// Normalize a package-relative path from a file list
///
/// Leading slashes and `.` components are dropped. `..` components and empty
/// paths are rejected so that a file list can never reach outside the
/// directory it is joined onto.
pub fn package_relative(relative: &str) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                warn!("Path traversal attempt detected: {}", relative);
                return Err(Error::InvalidPath(relative.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath(relative.to_string()));
    }
    Ok(normalized)
}

/// Join a package-relative path onto a prefix
pub fn target_path(prefix: &Path, relative: &str) -> Result<PathBuf> {
    Ok(prefix.join(package_relative(relative)?))
}

/// Decide the package-wide link type for a cache/prefix pairing
///
/// Tries to hardlink the cache's `urls` file into the root prefix. The probe
/// link is always removed again.
pub fn detect_link_type(pkgs_dir: &Path, root_prefix: &Path) -> Result<LinkType> {
    let src = pkgs_dir.join("urls");
    let dst = root_prefix.join(".hard-link");

    if !src.is_file() {
        return Err(Error::MissingFile(src));
    }
    if dst.is_file() {
        return Err(Error::DestinationExists(dst));
    }

    let link_type = match fs::hard_link(&src, &dst) {
        Ok(()) => LinkType::HardLink,
        Err(e) => {
            debug!("Hardlink probe failed ({}), falling back to copy", e);
            LinkType::Copy
        }
    };
    rm_rf(&dst);

    info!("Using link type: {}", link_type);
    Ok(link_type)
}
