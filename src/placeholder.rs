// src/placeholder.rs

//! Install-prefix placeholder rewriting
//!
//! Packages are built under a long dummy prefix which is baked into scripts,
//! config files and binaries. At install time every occurrence is replaced by
//! the real prefix.
//!
//! Text files are rewritten with a plain substitution. Binary files cannot
//! change length because they reference absolute offsets, so each
//! nul-terminated string containing the placeholder is rewritten in place and
//! padded with trailing nul bytes. This only works when the real prefix is no
//! longer than the placeholder.

use crate::error::{Error, Result};
use crate::filesystem::{write_with_retry, Backoff};
use regex::bytes::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Placeholder assumed for `has_prefix` entries that only name a file
// Kept in two pieces so this binary never contains the placeholder itself.
pub const PREFIX_PLACEHOLDER: &str = concat!("/opt/anaconda1anaconda2", "anaconda3");

/// How a file's placeholder is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PlaceholderMode {
    Text,
    Binary,
}

impl PlaceholderMode {
    /// Parse a `has_prefix` mode token
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
            .map_err(|_| Error::InvalidPlaceholderMode(s.to_string()))
    }
}

/// Replace every occurrence of `from` in `data` with `to`
pub fn text_replace(data: &[u8], from: &str, to: &str) -> Result<Vec<u8>> {
    let pattern = Regex::new(&regex::escape(from))?;
    Ok(pattern.replace_all(data, NoExpand(to.as_bytes())).into_owned())
}

/// Length-preserving replacement of `from` with `to` in nul-terminated strings
///
/// Each match is the placeholder followed by the shortest run of non-nul
/// bytes up to a nul. All placeholder occurrences inside the match are
/// replaced and the match is padded with nul bytes back to its old length.
pub fn binary_replace(data: &[u8], from: &str, to: &str) -> Result<Vec<u8>> {
    let run = Regex::new(&format!(r"{}(?-u:[^\x00])*?\x00", regex::escape(from)))?;
    let literal = Regex::new(&regex::escape(from))?;

    let mut out = Vec::with_capacity(data.len());
    let mut last = 0;
    for m in run.find_iter(data) {
        let matched = m.as_bytes();
        let occurrences = literal.find_iter(matched).count() as isize;
        let padding = (from.len() as isize - to.len() as isize) * occurrences;
        if padding < 0 {
            return Err(Error::Padding {
                placeholder: from.to_string(),
                replacement: to.to_string(),
                padding,
            });
        }

        out.extend_from_slice(&data[last..m.start()]);
        out.extend_from_slice(&literal.replace_all(matched, NoExpand(to.as_bytes())));
        out.resize(out.len() + padding as usize, 0);
        last = m.end();
    }
    out.extend_from_slice(&data[last..]);

    debug_assert_eq!(out.len(), data.len());
    Ok(out)
}

/// Rewrite `placeholder` to `new_prefix` in the file at `path`
///
/// Symlinks are resolved first so the rewrite hits the real file. The file is
/// only written when its content changes, and its permission bits are kept.
/// Returns whether the file was rewritten.
pub fn update_prefix(
    path: &Path,
    new_prefix: &str,
    placeholder: &str,
    mode: PlaceholderMode,
    backoff: &dyn Backoff,
) -> Result<bool> {
    // Forward slashes avoid escaping issues in rewritten files
    let new_prefix = if cfg!(windows) {
        new_prefix.replace('\\', "/")
    } else {
        new_prefix.to_string()
    };

    let path = fs::canonicalize(path)?;
    let data = fs::read(&path)?;
    let new_data = match mode {
        PlaceholderMode::Text => text_replace(&data, placeholder, &new_prefix)?,
        PlaceholderMode::Binary => binary_replace(&data, placeholder, &new_prefix)?,
    };

    if new_data == data {
        return Ok(false);
    }

    let permissions = fs::symlink_metadata(&path)?.permissions();
    write_with_retry(&path, &new_data, backoff)?;
    fs::set_permissions(&path, permissions)?;

    debug!("Rewrote {} placeholder in {}", mode, path.display());
    Ok(true)
}
