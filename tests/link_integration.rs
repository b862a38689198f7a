// tests/link_integration.rs

//! Integration tests for linking environments from a package cache.

mod common;

use common::{TestRoot, PLACEHOLDER};
use pkglink::{
    duplicates_to_remove, Dist, Error, InstallManifest, Installer, LinkConfig, LinkType, Linker,
};
use std::fs;

fn manifest(root: &TestRoot, dists: &[&str]) -> InstallManifest {
    let mut content = String::from("installed_by = \"TestInstaller-1.0\"\n");
    for dist in dists {
        content.push_str(&format!(
            "[packages.\"{}\"]\nurl = \"https://repo.example/pkgs/{}.tar.bz2\"\nmd5 = \"{}\"\n",
            dist,
            dist,
            "a".repeat(32)
        ));
    }
    let list: Vec<String> = dists.iter().map(|d| format!("\"{}\"", d)).collect();
    content.push_str(&format!("[environments]\nroot = [{}]\n", list.join(", ")));
    InstallManifest::load(&root.write_manifest(&content)).unwrap()
}

#[test]
fn test_install_root_environment() {
    let root = TestRoot::new();
    root.package("python-2.7.12-1")
        .file("lib/python2.7/os.py", b"import sys\n")
        .prefixed_text(
            "bin/python-config",
            &format!("#!/bin/sh\necho {}/include\n", PLACEHOLDER),
        )
        .build();
    root.package("zlib-1.2.8-3")
        .file("lib/libz.so.1.2.8", b"\x7fELF zlib")
        .build();

    let manifest = manifest(&root, &["python-2.7.12-1", "zlib-1.2.8-3"]);
    let installer = Installer::new(LinkConfig::new(root.path()), manifest);
    let reports = installer.link_environments().unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].packages.len(), 2);
    assert!(reports[0].retired.is_empty());

    let config = fs::read_to_string(root.path().join("bin/python-config")).unwrap();
    assert_eq!(
        config,
        format!("#!/bin/sh\necho {}/include\n", root.path().display())
    );

    let record = root.record(root.path(), "python-2.7.12-1");
    assert_eq!(record["name"], "python");
    assert_eq!(record["platform"], "linux");
    assert_eq!(record["installed_by"], "TestInstaller-1.0");
    assert_eq!(record["link"]["type"], "hard-link");
    assert_eq!(
        record["url"],
        "https://repo.example/pkgs/python-2.7.12-1.tar.bz2"
    );
    assert_eq!(record["files"].as_array().unwrap().len(), 2);
}

#[test]
#[cfg(unix)]
fn test_per_file_link_type_selection() {
    use std::os::unix::fs::MetadataExt;

    let root = TestRoot::new();
    root.package("tool-1.0-0")
        .file("lib/libtool.so.1", b"elf")
        .symlink("lib/libtool.so", "libtool.so.1")
        .file("etc/tool.conf", b"setting=1\n")
        .no_link("etc/tool.conf")
        .build();

    let config = LinkConfig::new(root.path());
    let manifest = InstallManifest::default();
    Linker::new(&config, &manifest)
        .link(root.path(), &Dist::new("tool-1.0-0"), Some(LinkType::HardLink))
        .unwrap();

    let cache = root.pkgs().join("tool-1.0-0");
    let ino = |p: &std::path::Path| fs::metadata(p).unwrap().ino();

    // plain file: hardlinked
    assert_eq!(
        ino(&cache.join("lib/libtool.so.1")),
        ino(&root.path().join("lib/libtool.so.1"))
    );
    // no_link file: copied
    assert_ne!(
        ino(&cache.join("etc/tool.conf")),
        ino(&root.path().join("etc/tool.conf"))
    );
    // relative symlink: recreated
    assert_eq!(
        fs::read_link(root.path().join("lib/libtool.so")).unwrap(),
        std::path::Path::new("libtool.so.1")
    );
}

#[test]
fn test_binary_placeholder_keeps_file_length() {
    let root = TestRoot::new();
    let placeholder = format!("/{}", "p".repeat(250));
    let mut content = b"\x7fELF\x00\x00".to_vec();
    content.extend_from_slice(placeholder.as_bytes());
    content.extend_from_slice(b"/lib\x00trailer");
    root.package("libfoo-1.0-0")
        .prefixed_binary("lib/libfoo.so", &placeholder, &content)
        .build();

    let config = LinkConfig::new(root.path());
    let manifest = InstallManifest::default();
    let report = Linker::new(&config, &manifest)
        .link(root.path(), &Dist::new("libfoo-1.0-0"), Some(LinkType::HardLink))
        .unwrap();
    assert_eq!(report.rewritten, 1);

    let rewritten = fs::read(root.path().join("lib/libfoo.so")).unwrap();
    assert_eq!(rewritten.len(), content.len());
    let expected = format!("{}/lib", root.path().display());
    assert_eq!(&rewritten[6..6 + expected.len()], expected.as_bytes());
    assert!(rewritten.ends_with(b"\x00trailer"));

    // the cached original is untouched
    let cached = fs::read(root.pkgs().join("libfoo-1.0-0/lib/libfoo.so")).unwrap();
    assert_eq!(cached, content);
}

#[test]
fn test_existing_file_requires_force() {
    let root = TestRoot::new();
    root.package("a-1.0-0").file("share/a.txt", b"new").build();
    fs::create_dir_all(root.path().join("share")).unwrap();
    fs::write(root.path().join("share/a.txt"), b"old").unwrap();

    let manifest = manifest(&root, &["a-1.0-0"]);
    let installer = Installer::new(LinkConfig::new(root.path()), manifest.clone());
    let err = installer.link_environments().unwrap_err();
    assert!(matches!(err, Error::DestinationExists(_)));

    let installer = Installer::new(LinkConfig::new(root.path()).with_force(true), manifest);
    installer.link_environments().unwrap();
    assert_eq!(fs::read(root.path().join("share/a.txt")).unwrap(), b"new");
}

#[test]
fn test_reinstall_replaces_older_build_record() {
    let root = TestRoot::new();
    root.package("a-1.0-0").file("share/a-1.txt", b"1").build();
    root.package("a-2.0-0").file("share/a-2.txt", b"2").build();

    let first = Installer::new(
        LinkConfig::new(root.path()),
        manifest(&root, &["a-1.0-0"]),
    );
    first.link_environments().unwrap();

    let second = Installer::new(
        LinkConfig::new(root.path()),
        manifest(&root, &["a-2.0-0"]),
    );
    let reports = second.link_environments().unwrap();

    assert_eq!(reports[0].retired, vec![Dist::new("a-1.0-0")]);
    let meta = root.path().join("conda-meta");
    assert!(meta.join("a-1.0-0.json.bak").exists());
    assert!(meta.join("a-2.0-0.json").exists());
    // package files of the retired build stay in place
    assert!(root.path().join("share/a-1.txt").exists());

    let installed = pkglink::metadata::linked(root.path()).unwrap();
    assert!(duplicates_to_remove(&installed, &[Dist::new("a-2.0-0")]).is_empty());
}

#[test]
fn test_record_without_manifest_entry_or_urls() {
    let root = TestRoot::new();
    root.package("extra-0.1-0").file("bin/extra", b"x").build();

    let config = LinkConfig::new(root.path());
    let manifest = InstallManifest::default();
    Linker::new(&config, &manifest)
        .link(root.path(), &Dist::new("extra-0.1-0"), Some(LinkType::Copy))
        .unwrap();

    let record = root.record(root.path(), "extra-0.1-0");
    assert!(record.get("url").is_none());
    assert!(record.get("md5").is_none());
    assert_eq!(record["name"], "extra");
    assert_eq!(record["files"][0], "bin/extra");
    assert_eq!(record["link"]["type"], "copy");
}

#[test]
fn test_post_extract_named_environment() {
    let root = TestRoot::new();
    let prefix = root.path().join("envs/py35");
    fs::create_dir_all(prefix.join("info")).unwrap();
    fs::create_dir_all(prefix.join("bin")).unwrap();
    fs::write(prefix.join("bin/pip"), format!("#!{}/bin/python\n", PLACEHOLDER)).unwrap();
    fs::write(prefix.join("info/files"), "bin/pip\n").unwrap();
    fs::write(prefix.join("info/has_prefix"), "bin/pip\n").unwrap();
    fs::write(
        prefix.join("info/index.json"),
        r#"{"name": "pip", "version": "8.1.2", "build": "py35_0"}"#,
    )
    .unwrap();

    let installer = Installer::new(LinkConfig::new(root.path()), InstallManifest::default());
    let dist = installer.post_extract("py35").unwrap();

    assert_eq!(dist.as_str(), "pip-8.1.2-py35_0");
    assert!(!prefix.join("info").exists());
    assert_eq!(
        fs::read_to_string(prefix.join("bin/pip")).unwrap(),
        format!("#!{}/bin/python\n", prefix.display())
    );
    let record = root.record(&prefix, "pip-8.1.2-py35_0");
    assert!(record["link"].is_null());
}

#[test]
fn test_unknown_package_in_environment() {
    let root = TestRoot::new();
    let path = root.write_manifest("[environments]\nroot = [\"ghost-1.0-0\"]\n");

    let err = InstallManifest::load(&path).unwrap_err();
    assert!(matches!(err, Error::UnknownPackage { .. }));
}
