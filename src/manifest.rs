// src/manifest.rs

//! Install manifest
//!
//! The installer ships a manifest describing every package it carries and
//! which environments to populate from them.
//!
//! # Example install-manifest.toml
//!
//! ```toml
//! installed_by = "Distribution-4.2.0-Linux-x86_64"
//!
//! [packages."python-2.7.12-1"]
//! url = "https://repo.example/pkgs/python-2.7.12-1.tar.bz2"
//! md5 = "5a6f7b3a2b7e1f4f5f1c0e9d8c7b6a59"
//!
//! [packages."zlib-1.2.8-3"]
//! url = "https://repo.example/pkgs/zlib-1.2.8-3.tar.bz2"
//! md5 = "60d5ea874984e4c750f187a26c827382"
//!
//! [environments]
//! root = ["python-2.7.12-1", "zlib-1.2.8-3"]
//! ```
//!
//! Files ending in `.json` are read as JSON with the same structure.

use crate::dist::Dist;
use crate::error::{Error, Result};
use crate::metadata::Origin;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default manifest file name inside the package cache
pub const MANIFEST_FILENAME: &str = "install-manifest.toml";

/// Download location and checksum of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSource {
    pub url: String,
    pub md5: String,
}

/// Packages carried by the installer and the environments built from them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallManifest {
    /// Installer identity recorded in every install record
    #[serde(default)]
    pub installed_by: Option<String>,

    /// Package manifest: dist -> origin
    #[serde(default)]
    pub packages: BTreeMap<Dist, PackageSource>,

    /// Environment manifest: environment name -> dists in install order
    #[serde(default)]
    pub environments: BTreeMap<String, Vec<Dist>>,
}

impl InstallManifest {
    /// Load a manifest from disk, TOML unless the extension is `.json`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let manifest: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Resolve the manifest for a run
    ///
    /// An explicitly given path must exist. Without one, the default
    /// `<pkgs_dir>/install-manifest.toml` is optional and an empty manifest
    /// stands in when it is absent.
    pub fn locate(explicit: Option<&Path>, pkgs_dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) if !path.is_file() => Err(Error::MissingFile(path.to_path_buf())),
            Some(path) => Self::load(path),
            None => {
                let path = pkgs_dir.join(MANIFEST_FILENAME);
                if path.is_file() {
                    Self::load(&path)
                } else {
                    debug!("No install manifest at {}", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML manifest
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Every dist named by an environment must be a known package
    pub fn validate(&self) -> Result<()> {
        for (env, dists) in &self.environments {
            if let Some(dist) = dists.iter().find(|d| !self.packages.contains_key(*d)) {
                return Err(Error::UnknownPackage {
                    env: env.clone(),
                    dist: dist.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Origin of `dist` if the manifest carries it
    pub fn origin(&self, dist: &Dist) -> Option<Origin> {
        self.packages.get(dist).map(|source| Origin {
            url: Some(source.url.clone()),
            md5: Some(source.md5.clone()),
        })
    }
}
