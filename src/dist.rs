// src/dist.rs

//! Package identifiers
//!
//! A dist names one package build as `name-version-build`, e.g.
//! `numpy-1.11.1-py27_0`. The name may itself contain hyphens; version and
//! build never do, so the name is everything before the last two separators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical package build identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dist(String);

impl Dist {
    pub fn new(dist: impl Into<String>) -> Self {
        Self(dist.into())
    }

    /// Build a dist from the `name`, `version` and `build` descriptor fields
    pub fn from_parts(name: &str, version: &str, build: &str) -> Self {
        Self(format!("{}-{}-{}", name, version, build))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package name with version and build stripped
    pub fn name(&self) -> &str {
        name_dist(&self.0)
    }

    /// Archive filename as it appears in download URLs
    pub fn archive_filename(&self) -> String {
        format!("{}.tar.bz2", self.0)
    }

    /// File name of the install record for this dist
    pub fn record_filename(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for Dist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Dist {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Dist {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Dist {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip the last two hyphen-separated segments from a dist string
pub fn name_dist(dist: &str) -> &str {
    dist.rsplitn(3, '-').last().unwrap_or(dist)
}
