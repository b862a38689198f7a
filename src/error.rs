// src/error.rs

//! Crate-wide error type

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while linking packages into a prefix
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Install manifest could not be parsed
    #[error("failed to parse install manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    /// Placeholder pattern failed to compile
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Binary replacement would need to grow the file
    #[error(
        "padding error: placeholder {placeholder:?} cannot hold {replacement:?} (padding {padding})"
    )]
    Padding {
        placeholder: String,
        replacement: String,
        padding: isize,
    },

    /// Placeholder shorter than the install prefix, reported per package
    #[error("placeholder '{placeholder}' too short in: {dist}")]
    PlaceholderTooShort { placeholder: String, dist: String },

    /// `has_prefix` declared a mode other than `text` or `binary`
    #[error("invalid placeholder mode: {0}")]
    InvalidPlaceholderMode(String),

    /// Destination already present and force is off
    #[error("dst exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Package-relative path escapes the prefix or is empty
    #[error("invalid package path: {0}")]
    InvalidPath(String),

    /// Strict mode: some files of a package could not be placed
    #[error("{dist}: {} file(s) could not be linked: {}", .failures.len(), .failures.join(", "))]
    LinkFailures { dist: String, failures: Vec<String> },

    /// Post-link script exited unsuccessfully
    #[error("post-link failed for: {0}")]
    PostLinkFailed(String),

    /// Lifecycle script could not be started or timed out
    #[error("script error: {0}")]
    Script(String),

    /// Writes kept failing with permission errors
    #[error("max_tries={max_tries} reached writing {}", .path.display())]
    RetriesExhausted { path: PathBuf, max_tries: u32 },

    /// Environment lists a package the manifest does not know
    #[error("package {dist} in environment '{env}' is missing from the package manifest")]
    UnknownPackage { env: String, dist: String },

    /// Required file in the package cache or prefix is missing
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Package descriptor is missing a required field
    #[error("invalid package descriptor {}: {reason}", .path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },
}
