// tests/common/mod.rs

//! Shared test utilities: a fake package cache under a temporary root.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Placeholder baked into test packages
pub const PLACEHOLDER: &str = "/opt/anaconda1anaconda2anaconda3";

/// A temporary root prefix with an empty `pkgs/urls`
pub struct TestRoot {
    pub dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkgs")).unwrap();
        fs::write(dir.path().join("pkgs/urls"), "").unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn pkgs(&self) -> PathBuf {
        self.path().join("pkgs")
    }

    /// Start describing a package in the cache
    pub fn package(&self, dist: &str) -> PackageBuilder {
        PackageBuilder {
            dir: self.pkgs().join(dist),
            dist: dist.to_string(),
            files: Vec::new(),
            has_prefix: Vec::new(),
            no_link: Vec::new(),
        }
    }

    pub fn record(&self, prefix: &Path, dist: &str) -> serde_json::Value {
        let path = prefix.join("conda-meta").join(format!("{}.json", dist));
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    pub fn write_manifest(&self, content: &str) -> PathBuf {
        let path = self.pkgs().join("install-manifest.toml");
        fs::write(&path, content).unwrap();
        path
    }
}

/// Builds `<pkgs>/<dist>/` with an `info/` directory
pub struct PackageBuilder {
    dir: PathBuf,
    dist: String,
    files: Vec<String>,
    has_prefix: Vec<String>,
    no_link: Vec<String>,
}

impl PackageBuilder {
    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        let full = self.dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
        self.files.push(path.to_string());
        self
    }

    /// File whose content holds the default placeholder, text mode
    pub fn prefixed_text(mut self, path: &str, content: &str) -> Self {
        self.has_prefix.push(path.to_string());
        self.file(path, content.as_bytes())
    }

    /// File rewritten in binary mode with an explicit placeholder
    pub fn prefixed_binary(mut self, path: &str, placeholder: &str, content: &[u8]) -> Self {
        self.has_prefix
            .push(format!("{} binary {}", placeholder, path));
        self.file(path, content)
    }

    #[cfg(unix)]
    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        let full = self.dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(target, full).unwrap();
        self.files.push(path.to_string());
        self
    }

    pub fn no_link(mut self, path: &str) -> Self {
        self.no_link.push(path.to_string());
        self
    }

    pub fn build(self) {
        let info = self.dir.join("info");
        fs::create_dir_all(&info).unwrap();
        fs::write(info.join("files"), lines(&self.files)).unwrap();
        fs::write(info.join("has_prefix"), lines(&self.has_prefix)).unwrap();
        fs::write(info.join("no_link"), lines(&self.no_link)).unwrap();

        let mut parts = self.dist.rsplitn(3, '-');
        let build = parts.next().unwrap();
        let version = parts.next().unwrap();
        let name = parts.next().unwrap();
        fs::write(
            info.join("index.json"),
            format!(
                r#"{{"name": "{}", "version": "{}", "build": "{}", "platform": "linux"}}"#,
                name, version, build
            ),
        )
        .unwrap();
    }
}

fn lines(items: &[String]) -> String {
    items.iter().map(|i| format!("{}\n", i)).collect()
}
