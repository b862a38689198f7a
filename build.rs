// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("pkglink")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pkglink Contributors")
        .about("Link tool used by installers to populate environments from the package cache")
        .arg(
            Arg::new("root_prefix")
                .long("root-prefix")
                .value_name("PATH")
                .help("Root prefix (defaults to two levels above this executable)"),
        )
        .arg(
            Arg::new("post")
                .long("post")
                .value_name("NAME")
                .help("Perform post extract (on a single package) in environment NAME"),
        )
        .arg(
            Arg::new("skip_scripts")
                .long("skip-scripts")
                .action(ArgAction::SetTrue)
                .help("Skip running post-link scripts"),
        )
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .value_name("PATH")
                .help("Install manifest (defaults to <root>/pkgs/install-manifest.toml)"),
        )
        .arg(
            Arg::new("strict_links")
                .long("strict-links")
                .action(ArgAction::SetTrue)
                .help("Fail a package if any of its files could not be linked"),
        )
        .arg(
            Arg::new("script_timeout")
                .long("script-timeout")
                .value_name("SECS")
                .help("Kill post-link scripts running longer than SECS seconds"),
        )
        .after_help("Set FORCE=1 in the environment to replace files already present in the prefix.")
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("pkglink.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
