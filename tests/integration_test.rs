#![cfg(unix)]

use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::Server;
use predicates::prelude::*;
use std::io::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::{TempDir, tempdir};

const GE_REPO: &str = "/GloriousEggroll/proton-ge-custom";

fn create_tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(name).unwrap();
        header.set_mode(0o644);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// A command isolated from the user's home, cache and token.
fn protonfetcher(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("protonfetcher"));
    cmd.env("HOME", home.path())
        .env("XDG_CACHE_HOME", home.path().join(".cache"))
        .env_remove("GITHUB_TOKEN")
        .env_remove("PROTONFETCHER_EXTRACT_DIR")
        .env_remove("PROTONFETCHER_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn make_dirs(root: &Path, names: &[&str]) {
    for name in names {
        std::fs::create_dir_all(root.join(name)).unwrap();
    }
}

fn link_target(root: &Path, name: &str) -> Option<String> {
    std::fs::read_link(root.join(name))
        .ok()
        .map(|t| t.to_string_lossy().into_owned())
}

#[test]
fn test_end_to_end_fetch_latest() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_latest = server
        .mock("HEAD", format!("{}/releases/latest", GE_REPO).as_str())
        .with_status(302)
        .with_header(
            "location",
            &format!("{}{}/releases/tag/GE-Proton10-20", url, GE_REPO),
        )
        .create();
    let _mock_tag_page = server
        .mock("HEAD", format!("{}/releases/tag/GE-Proton10-20", GE_REPO).as_str())
        .with_status(200)
        .create();
    let _mock_release = server
        .mock(
            "GET",
            format!("/repos{}/releases/tags/GE-Proton10-20", GE_REPO).as_str(),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"tag_name": "GE-Proton10-20", "assets": [
                {"name": "GE-Proton10-20.sha512sum"},
                {"name": "GE-Proton10-20.tar.gz"}
            ]}"#,
        )
        .create();

    let tar_gz_bytes = create_tar_gz(&[
        ("GE-Proton10-20/version", "GE-Proton10-20"),
        ("GE-Proton10-20/proton", "#!/usr/bin/env python3"),
    ]);
    let mock_download = server
        .mock(
            "GET",
            format!("{}/releases/download/GE-Proton10-20/GE-Proton10-20.tar.gz", GE_REPO).as_str(),
        )
        .with_status(200)
        .with_body(&tar_gz_bytes)
        .create();

    let home = tempdir().unwrap();
    let root = home.path().join("compatibilitytools.d");
    let downloads = home.path().join("Downloads");
    make_dirs(&root, &["GE-Proton10-15", "GE-Proton9-27"]);

    protonfetcher(&home)
        .arg("-x")
        .arg(&root)
        .arg("-o")
        .arg(&downloads)
        .arg("--api-url")
        .arg(&url)
        .arg("--github-url")
        .arg(&url)
        .assert()
        .success()
        .stdout(predicate::str::ends_with("Success\n"));

    mock_download.assert();
    assert!(downloads.join("GE-Proton10-20.tar.gz").is_file());
    assert!(root.join("GE-Proton10-20/version").is_file());
    assert_eq!(link_target(&root, "GE-Proton").as_deref(), Some("GE-Proton10-20"));
    assert_eq!(
        link_target(&root, "GE-Proton-Fallback").as_deref(),
        Some("GE-Proton10-15")
    );
    assert_eq!(
        link_target(&root, "GE-Proton-Fallback2").as_deref(),
        Some("GE-Proton9-27")
    );
}

#[test]
fn test_list_recent_releases() {
    let mut server = Server::new();
    let url = server.url();
    let _mock_releases = server
        .mock("GET", "/repos/Etaash-mathamsetty/Proton/releases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"tag_name": "EM-10.0-30"}, {"tag_name": "EM-10.0-29"}]"#)
        .create();

    let home = tempdir().unwrap();
    protonfetcher(&home)
        .args(["--list", "--fork", "Proton-EM", "--api-url"])
        .arg(&url)
        .assert()
        .success()
        .stdout("Recent releases:\n  EM-10.0-30\n  EM-10.0-29\nSuccess\n");
}

#[test]
fn test_ls_all_forks() {
    let home = tempdir().unwrap();
    let root = std::fs::canonicalize(home.path()).unwrap().join("tools");
    make_dirs(&root, &["GE-Proton10-20"]);
    std::os::unix::fs::symlink("GE-Proton10-20", root.join("GE-Proton")).unwrap();

    protonfetcher(&home)
        .arg("--ls")
        .arg("-x")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Links for GE-Proton:\n  GE-Proton -> {}\n  GE-Proton-Fallback -> (not found)",
            root.join("GE-Proton10-20").display()
        )))
        .stdout(predicate::str::contains("Links for Proton-EM:"))
        .stdout(predicate::str::contains("Links for CachyOS:"));
}

#[test]
fn test_rm_promotes_next_version() {
    let home = tempdir().unwrap();
    let root = home.path().join("tools");
    make_dirs(
        &root,
        &["proton-EM-10.0-30", "proton-EM-10.0-20", "proton-EM-9.5-1"],
    );

    protonfetcher(&home)
        .args(["--fork", "Proton-EM", "--relink", "-x"])
        .arg(&root)
        .assert()
        .success();
    assert_eq!(
        link_target(&root, "Proton-EM").as_deref(),
        Some("proton-EM-10.0-30")
    );

    protonfetcher(&home)
        .args(["--fork", "Proton-EM", "--rm", "EM-10.0-30", "-x"])
        .arg(&root)
        .assert()
        .success()
        .stdout("Success\n");

    assert!(!root.join("proton-EM-10.0-30").exists());
    assert_eq!(
        link_target(&root, "Proton-EM").as_deref(),
        Some("proton-EM-10.0-20")
    );
    assert_eq!(
        link_target(&root, "Proton-EM-Fallback").as_deref(),
        Some("proton-EM-9.5-1")
    );
    assert_eq!(link_target(&root, "Proton-EM-Fallback2"), None);
}

#[test]
fn test_rm_unknown_release_fails() {
    let home = tempdir().unwrap();
    let root = home.path().join("tools");
    make_dirs(&root, &[]);

    protonfetcher(&home)
        .args(["--rm", "GE-Proton1-1", "-x"])
        .arg(&root)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Release directory does not exist",
        ));
}

#[test]
fn test_relink_without_versions_fails() {
    let home = tempdir().unwrap();
    let root = home.path().join("tools");

    protonfetcher(&home)
        .args(["--relink", "--fork", "CachyOS", "-x"])
        .arg(&root)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No valid CachyOS versions found"));
}

#[test]
fn test_conflicting_flags() {
    let home = tempdir().unwrap();

    protonfetcher(&home)
        .args(["--list", "--release", "GE-Proton10-20"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: --list and --release cannot be used together",
        ));

    protonfetcher(&home)
        .args(["--ls", "--list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: --ls cannot be used with --release or --list",
        ));

    protonfetcher(&home)
        .args(["--rm", "GE-Proton10-20", "--ls"])
        .assert()
        .failure()
        .code(1);

    protonfetcher(&home)
        .args(["--relink", "--release", "GE-Proton10-20"])
        .assert()
        .failure()
        .code(1);
}
