// src/package.rs

//! Reading the `info/` directory of an extracted package
//!
//! Layout of `<pkgs>/<dist>/info/`:
//! - `index.json`: package descriptor (name, version, build, ...)
//! - `files`: relative paths of every file in the package
//! - `has_prefix`: files containing the build prefix placeholder
//! - `no_link`, `no_softlink`: files that must be copied, never linked

use crate::dist::Dist;
use crate::error::{Error, Result};
use crate::placeholder::{PlaceholderMode, PREFIX_PLACEHOLDER};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder rewrite declared for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderEntry {
    pub placeholder: String,
    pub mode: PlaceholderMode,
}

impl Default for PlaceholderEntry {
    fn default() -> Self {
        Self {
            placeholder: PREFIX_PLACEHOLDER.to_string(),
            mode: PlaceholderMode::Text,
        }
    }
}

/// Parsed contents of a package's info directory
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub info_dir: PathBuf,
    /// Files in declaration order
    pub files: Vec<String>,
    /// Placeholder entries keyed (and therefore sorted) by relative path
    pub has_prefix: BTreeMap<String, PlaceholderEntry>,
    pub no_link: HashSet<String>,
}

impl PackageInfo {
    /// Read `files`, `has_prefix`, `no_link` and `no_softlink`
    ///
    /// `files` is required; the others default to empty when absent.
    pub fn read(info_dir: &Path) -> Result<Self> {
        let files_path = info_dir.join("files");
        if !files_path.is_file() {
            return Err(Error::MissingFile(files_path));
        }

        let files = read_lines(&files_path)?;
        let has_prefix = read_has_prefix(&info_dir.join("has_prefix"))?;
        let no_link = read_no_link(info_dir)?;

        debug!(
            "Read package info {}: {} files, {} with placeholders, {} no-link",
            info_dir.display(),
            files.len(),
            has_prefix.len(),
            no_link.len()
        );

        Ok(Self {
            info_dir: info_dir.to_path_buf(),
            files,
            has_prefix,
            no_link,
        })
    }

    /// Whether `file` must be copied rather than linked
    pub fn requires_copy(&self, file: &str) -> bool {
        self.has_prefix.contains_key(file) || self.no_link.contains(file)
    }
}

/// Read `index.json` as a JSON object
pub fn read_index(info_dir: &Path) -> Result<Map<String, Value>> {
    let path = info_dir.join("index.json");
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::MissingFile(path)),
        Err(e) => return Err(e.into()),
    };

    match serde_json::from_str(&content)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidDescriptor {
            path,
            reason: "expected a JSON object".to_string(),
        }),
    }
}

/// Dist named by the `name`, `version` and `build` fields of `index.json`
pub fn dist_from_index(info_dir: &Path) -> Result<Dist> {
    let index = read_index(info_dir)?;
    let field = |key: &str| -> Result<String> {
        match index.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(Error::InvalidDescriptor {
                path: info_dir.join("index.json"),
                reason: format!("missing field '{}'", key),
            }),
        }
    };

    Ok(Dist::from_parts(
        &field("name")?,
        &field("version")?,
        &field("build")?,
    ))
}

/// Non-empty, non-comment lines of a file, trimmed
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Read lines of an optional file; a missing file yields no lines
fn read_optional_lines(path: &Path) -> Result<Vec<String>> {
    match read_lines(path) {
        Ok(lines) => Ok(lines),
        Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Parse `has_prefix` into a map from file to placeholder entry
///
/// Each line is either `placeholder mode path` or just `path`, in which case
/// the default placeholder and text mode apply.
pub fn read_has_prefix(path: &Path) -> Result<BTreeMap<String, PlaceholderEntry>> {
    let mut entries = BTreeMap::new();
    for line in read_optional_lines(path)? {
        match split_words(&line).as_deref() {
            Some([placeholder, mode, file]) => {
                entries.insert(
                    file.clone(),
                    PlaceholderEntry {
                        placeholder: placeholder.clone(),
                        mode: PlaceholderMode::parse(mode)?,
                    },
                );
            }
            _ => {
                entries.insert(line.clone(), PlaceholderEntry::default());
            }
        }
    }
    Ok(entries)
}

/// Union of `no_link` and `no_softlink`
pub fn read_no_link(info_dir: &Path) -> Result<HashSet<String>> {
    let mut res = HashSet::new();
    for name in ["no_link", "no_softlink"] {
        res.extend(read_optional_lines(&info_dir.join(name))?);
    }
    Ok(res)
}

/// Split a line into words, non-POSIX shell style
///
/// A quote opens a quoted word only at the start of a word, and the closing
/// quote ends that word. Quotes inside a word are literal. Surrounding quotes
/// are stripped from every word afterwards. Returns `None` on an unterminated
/// quote.
fn split_words(line: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    words.push(std::mem::take(&mut current));
                    quote = None;
                }
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None if current.is_empty() && (c == '"' || c == '\'') => {
                current.push(c);
                quote = Some(c);
            }
            None => current.push(c),
        }
    }

    if quote.is_some() {
        return None;
    }
    if !current.is_empty() {
        words.push(current);
    }

    Some(
        words
            .into_iter()
            .map(|w| w.trim_matches(|c| c == '"' || c == '\'').to_string())
            .collect(),
    )
}
