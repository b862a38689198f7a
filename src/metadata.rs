// src/metadata.rs

//! Install records
//!
//! Every package linked into a prefix gets a record at
//! `<prefix>/conda-meta/<dist>.json`: the package's `index.json` merged with
//! the installed file list, how the files were linked, where the package came
//! from and which installer put it there.

use crate::dist::Dist;
use crate::error::Result;
use crate::filesystem::{rm_rf, LinkType};
use crate::package::read_index;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Directory inside a prefix holding install records
pub const META_DIR: &str = "conda-meta";

/// Where and how a package's files were linked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkDescriptor {
    pub source: PathBuf,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

/// Download origin of a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Origin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

impl Origin {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.md5.is_none()
    }
}

/// Fields merged over `index.json` when writing a record
#[derive(Debug, Clone, Serialize)]
pub struct InstallRecord {
    pub files: Vec<String>,
    pub link: Option<LinkDescriptor>,
    #[serde(flatten)]
    pub origin: Origin,
    pub installed_by: String,
}

/// Path of the record for `dist` in `prefix`
pub fn record_path(prefix: &Path, dist: &Dist) -> PathBuf {
    prefix.join(META_DIR).join(dist.record_filename())
}

/// Write the install record for `dist`, replacing any previous one
///
/// Keys are sorted and the JSON is indented by two spaces.
pub fn create_meta(
    prefix: &Path,
    dist: &Dist,
    info_dir: &Path,
    extra: &InstallRecord,
) -> Result<PathBuf> {
    let mut meta = read_index(info_dir)?;
    if let serde_json::Value::Object(fields) = serde_json::to_value(extra)? {
        meta.extend(fields);
    }

    let meta_dir = prefix.join(META_DIR);
    fs::create_dir_all(&meta_dir)?;

    let path = record_path(prefix, dist);
    let mut json = serde_json::to_string_pretty(&SortedKeys(&Value::Object(meta)))?;
    json.push('\n');
    fs::write(&path, json)?;

    debug!("Wrote install record {}", path.display());
    Ok(path)
}

/// Serializes a JSON value with object keys sorted at every level,
/// independent of how `serde_json::Map` orders its entries
struct SortedKeys<'a>(&'a Value);

impl Serialize for SortedKeys<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(fields) => {
                let mut entries: Vec<(&String, &Value)> = fields.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, &SortedKeys(value))?;
                }
                map.end()
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(SortedKeys)),
            other => other.serialize(serializer),
        }
    }
}

/// Dists with an install record in `prefix`
pub fn linked(prefix: &Path) -> Result<BTreeSet<Dist>> {
    let meta_dir = prefix.join(META_DIR);
    let entries = match fs::read_dir(&meta_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dists = BTreeSet::new();
    for entry in entries {
        let name = entry?.file_name();
        if let Some(dist) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
            dists.insert(Dist::new(dist));
        }
    }
    Ok(dists)
}

/// Move a superseded record aside as `<dist>.json.bak`
///
/// Falls back to deleting the record when the rename fails. Package files
/// stay where they are.
pub fn retire_record(prefix: &Path, dist: &Dist) {
    let path = record_path(prefix, dist);
    warn!("unlinking: {}", path.display());

    let mut backup = path.clone().into_os_string();
    backup.push(".bak");
    if let Err(e) = fs::rename(&path, &backup) {
        debug!("Rename of {} failed ({}), removing", path.display(), e);
        rm_rf(&path);
    }
}

static URL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<baseurl>\S+/)(?P<fn>[^\s#/]+)(#(?P<md5>[0-9a-f]{32}))?$").unwrap()
});

/// Look up `dist` in the cache's `urls` history
///
/// The file lists `baseurl/filename[#md5]` entries, newest last, so it is
/// searched from the end. A missing file or no match gives an empty origin.
pub fn read_urls(pkgs_dir: &Path, dist: &Dist) -> Origin {
    let data = match fs::read_to_string(pkgs_dir.join("urls")) {
        Ok(data) => data,
        Err(e) => {
            debug!("No urls history in {}: {}", pkgs_dir.display(), e);
            return Origin::default();
        }
    };

    let filename = dist.archive_filename();
    for token in data.split_whitespace().rev() {
        let Some(caps) = URL_LINE.captures(token) else {
            continue;
        };
        if &caps["fn"] == filename {
            return Origin {
                url: Some(format!("{}{}", &caps["baseurl"], &caps["fn"])),
                md5: caps.name("md5").map(|m| m.as_str().to_string()),
            };
        }
    }
    Origin::default()
}
