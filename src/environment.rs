// src/environment.rs

//! Populating environments from the install manifest
//!
//! Environments are processed in name order. Each environment's packages are
//! linked in manifest order, after which superseded builds of the same
//! package name are retired from the environment's records.

use crate::config::LinkConfig;
use crate::dist::Dist;
use crate::duplicates::duplicates_to_remove;
use crate::error::{Error, Result};
use crate::filesystem::{detect_link_type, LinkType};
use crate::linker::{LinkReport, Linker};
use crate::manifest::InstallManifest;
use crate::metadata::{linked, retire_record};
use crate::package::dist_from_index;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Result of populating one environment
#[derive(Debug, Clone)]
pub struct EnvironmentReport {
    pub name: String,
    pub prefix: PathBuf,
    pub packages: Vec<(Dist, LinkReport)>,
    /// Records moved aside by duplicate resolution
    pub retired: Vec<Dist>,
}

/// Drives linking for whole environments
pub struct Installer {
    config: LinkConfig,
    manifest: InstallManifest,
}

impl Installer {
    pub fn new(config: LinkConfig, manifest: InstallManifest) -> Self {
        Self { config, manifest }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn manifest(&self) -> &InstallManifest {
        &self.manifest
    }

    /// Link every environment of the manifest
    ///
    /// The package-wide link type is probed once: hardlinks when the cache and
    /// root prefix share a filesystem, copies otherwise.
    pub fn link_environments(&self) -> Result<Vec<EnvironmentReport>> {
        let link_type = detect_link_type(&self.config.pkgs_dir, &self.config.root_prefix)?;

        let mut reports = Vec::new();
        for (name, dists) in &self.manifest.environments {
            if dists.is_empty() {
                continue;
            }
            reports.push(self.link_environment(name, dists, link_type)?);
        }
        Ok(reports)
    }

    fn link_environment(
        &self,
        name: &str,
        dists: &[Dist],
        link_type: LinkType,
    ) -> Result<EnvironmentReport> {
        let prefix = self.config.prefix_env(name);
        info!(
            "Populating environment '{}' at {} ({} packages)",
            name,
            prefix.display(),
            dists.len()
        );

        let linker = Linker::new(&self.config, &self.manifest);
        let mut packages = Vec::with_capacity(dists.len());
        for dist in dists {
            if !self.manifest.packages.contains_key(dist) {
                return Err(Error::UnknownPackage {
                    env: name.to_string(),
                    dist: dist.to_string(),
                });
            }
            let report = linker.link(&prefix, dist, Some(link_type))?;
            packages.push((dist.clone(), report));
        }

        let installed = linked(&prefix)?;
        let retired = duplicates_to_remove(&installed, dists);
        for dist in &retired {
            retire_record(&prefix, dist);
        }

        Ok(EnvironmentReport {
            name: name.to_string(),
            prefix,
            packages,
            retired,
        })
    }

    /// Finish a package that was extracted directly into environment `env_name`
    ///
    /// Rewrites placeholders, runs `post-link` and writes the record, then
    /// removes the extracted `info/` directory.
    pub fn post_extract(&self, env_name: &str) -> Result<Dist> {
        let prefix = self.config.prefix_env(env_name);
        let info_dir = prefix.join("info");
        let dist = dist_from_index(&info_dir)?;

        info!("Post-extract of {} in {}", dist, prefix.display());
        Linker::new(&self.config, &self.manifest).link(&prefix, &dist, None)?;
        fs::remove_dir_all(&info_dir)?;
        Ok(dist)
    }
}
