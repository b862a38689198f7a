// src/lib.rs

//! pkglink: installer link tool
//!
//! Populates environment prefixes from a cache of extracted packages. This is
//! the last step of a self-extracting installer: archives are already
//! unpacked into `<root>/pkgs/<dist>/`, and each package now has to be made
//! visible in its environment.
//!
//! # Architecture
//!
//! - Placement: files are hardlinked from the cache, copied when they must be
//!   rewritten or must not be shared, relative symlinks are kept as symlinks
//! - Placeholders: the build-time prefix baked into files is rewritten to the
//!   real prefix, length-preserving for binaries
//! - Scripts: a package's `post-link` script runs once its files are in place
//! - Records: `conda-meta/<dist>.json` describes every linked package
//! - Duplicates: one build per package name survives in each environment

pub mod config;
pub mod dist;
pub mod duplicates;
pub mod environment;
mod error;
pub mod filesystem;
pub mod linker;
pub mod manifest;
pub mod metadata;
pub mod package;
pub mod placeholder;
pub mod scriptlet;

pub use config::LinkConfig;
pub use dist::{name_dist, Dist};
pub use duplicates::duplicates_to_remove;
pub use environment::{EnvironmentReport, Installer};
pub use error::{Error, Result};
pub use filesystem::LinkType;
pub use linker::{LinkReport, Linker};
pub use manifest::InstallManifest;
pub use placeholder::{update_prefix, PlaceholderMode};
