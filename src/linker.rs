// src/linker.rs

//! Linking one package into a prefix
//!
//! For each package:
//! 1. Place every file from the cache into the prefix
//! 2. Rewrite install-prefix placeholders
//! 3. Run the `post-link` script
//! 4. Write the install record
//!
//! Packages that were extracted straight into the prefix skip step 1.

use crate::config::{LinkConfig, DEFAULT_INSTALLED_BY};
use crate::dist::Dist;
use crate::error::{Error, Result};
use crate::filesystem::{lexists, package_relative, place_file, rm_rf, target_path, LinkType};
use crate::manifest::InstallManifest;
use crate::metadata::{create_meta, read_urls, InstallRecord, LinkDescriptor, Origin};
use crate::package::PackageInfo;
use crate::placeholder::update_prefix;
use crate::scriptlet::{ScriptAction, ScriptOutcome, ScriptRunner};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happened while linking one package
#[derive(Debug, Clone, Default)]
pub struct LinkReport {
    /// Files placed in the prefix
    pub linked: usize,
    /// Files whose placement failed, with the OS error
    pub skipped: Vec<(String, String)>,
    /// Files whose placeholder was rewritten
    pub rewritten: usize,
    pub script: Option<ScriptOutcome>,
    pub record: PathBuf,
}

/// Links packages from the cache into prefixes
pub struct Linker<'a> {
    config: &'a LinkConfig,
    manifest: &'a InstallManifest,
}

impl<'a> Linker<'a> {
    pub fn new(config: &'a LinkConfig, manifest: &'a InstallManifest) -> Self {
        Self { config, manifest }
    }

    /// Link `dist` into `prefix`
    ///
    /// With `link_type`, files come from `<pkgs>/<dist>`. Without, the package
    /// is assumed to be extracted in place already and its metadata is read
    /// from `<prefix>/info`.
    pub fn link(&self, prefix: &Path, dist: &Dist, link_type: Option<LinkType>) -> Result<LinkReport> {
        let source_dir = self.config.pkgs_dir.join(dist.as_str());
        let info_dir = match link_type {
            Some(_) => source_dir.join("info"),
            None => prefix.join("info"),
        };

        info!("Linking {} into {}", dist, prefix.display());
        let package = PackageInfo::read(&info_dir)?;
        let mut report = LinkReport::default();

        if let Some(link_type) = link_type {
            self.place_files(prefix, dist, &source_dir, &package, link_type, &mut report)?;
        }

        let new_prefix = prefix.to_string_lossy();
        for (file, entry) in &package.has_prefix {
            let path = target_path(prefix, file)?;
            let rewritten = update_prefix(
                &path,
                &new_prefix,
                &entry.placeholder,
                entry.mode,
                self.config.backoff.as_ref(),
            )
            .map_err(|e| match e {
                Error::Padding { placeholder, .. } => Error::PlaceholderTooShort {
                    placeholder,
                    dist: dist.to_string(),
                },
                other => other,
            })?;
            if rewritten {
                report.rewritten += 1;
            }
        }

        let runner = ScriptRunner::new(prefix)
            .with_skip_scripts(self.config.skip_scripts)
            .with_timeout(self.config.script_timeout);
        let outcome = runner.run(dist, ScriptAction::PostLink)?;
        if !outcome.is_success() {
            return Err(Error::PostLinkFailed(dist.to_string()));
        }
        report.script = Some(outcome);

        let extra = InstallRecord {
            files: package.files.clone(),
            link: link_type.map(|link_type| LinkDescriptor {
                source: source_dir.clone(),
                link_type,
            }),
            origin: self.origin(dist),
            installed_by: self
                .manifest
                .installed_by
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTALLED_BY.to_string()),
        };
        report.record = create_meta(prefix, dist, &info_dir, &extra)?;

        info!(
            "Linked {}: {} files, {} skipped, {} rewritten",
            dist,
            report.linked,
            report.skipped.len(),
            report.rewritten
        );
        Ok(report)
    }

    fn place_files(
        &self,
        prefix: &Path,
        dist: &Dist,
        source_dir: &Path,
        package: &PackageInfo,
        link_type: LinkType,
        report: &mut LinkReport,
    ) -> Result<()> {
        for file in &package.files {
            let relative = package_relative(file)?;
            let src = source_dir.join(&relative);
            let dst = prefix.join(&relative);

            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)?;
            }

            if lexists(&dst) {
                if !self.config.force {
                    return Err(Error::DestinationExists(dst));
                }
                debug!("Removing existing {}", dst.display());
                rm_rf(&dst);
            }

            let is_symlink = src
                .symlink_metadata()
                .is_ok_and(|meta| meta.file_type().is_symlink());
            let file_link_type = if package.requires_copy(file) || is_symlink {
                LinkType::Copy
            } else {
                link_type
            };

            match place_file(&src, &dst, file_link_type) {
                Ok(()) => report.linked += 1,
                Err(e) => {
                    warn!("Could not {} {}: {}", file_link_type, file, e);
                    report.skipped.push((file.clone(), e.to_string()));
                }
            }
        }

        if self.config.strict_links && !report.skipped.is_empty() {
            return Err(Error::LinkFailures {
                dist: dist.to_string(),
                failures: report.skipped.iter().map(|(f, _)| f.clone()).collect(),
            });
        }
        Ok(())
    }

    /// Origin from the manifest, else from the cache's urls history
    fn origin(&self, dist: &Dist) -> Origin {
        self.manifest
            .origin(dist)
            .unwrap_or_else(|| read_urls(&self.config.pkgs_dir, dist))
    }
}
