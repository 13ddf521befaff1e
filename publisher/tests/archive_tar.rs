//! End-to-end archive creation with the host's GNU tar.
//!
//! Skipped when GNU tar is not installed.
#![cfg(target_os = "linux")]

use camino::Utf8PathBuf;
use pkg_publisher::archive::{ArchiveBuilder, ArchiveRequest, ArchiveServices, SignedArchiver};
use pkg_publisher::config::{BuildDefaults, BuildSettings};
use pkg_publisher::error::PublishError;
use pkg_publisher::exec::ShellExecutor;
use pkg_publisher::probe::GlobProbe;
use pkg_publisher::tool::PathToolLocator;
use pkg_publisher::version::VersioningMode;
use std::process::Command;
use tempfile::TempDir;

fn gnu_tar_available() -> bool {
    Command::new("tar")
        .arg("--version")
        .output()
        .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).contains("GNU tar"))
        .unwrap_or(false)
}

#[test]
fn builds_a_real_archive_inside_the_version_directory() {
    if !gnu_tar_available() {
        eprintln!("Skipping: GNU tar is not installed.");
        return;
    }

    let temp = TempDir::new().expect("temp dir");
    let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8 temp dir");
    let version_dir = base.join("pkg/project/1.1.1");
    let packages = version_dir.join("repos/el/7/products/x86_64");
    std::fs::create_dir_all(&packages).expect("create package dir");
    std::fs::write(packages.join("project-1.1.1-1.el7.x86_64.rpm"), b"rpm").expect("write rpm");

    let defaults = BuildDefaults {
        project: "project".to_owned(),
        version: Some("1.1.1".to_owned()),
        ..BuildDefaults::default()
    };
    let settings = BuildSettings {
        fail_on_missing_target: true,
        ..BuildSettings::default()
    };
    let services = ArchiveServices {
        locator: &PathToolLocator,
        versions: &defaults,
        probe: &GlobProbe,
        executor: &ShellExecutor,
    };

    let outcome = ArchiveBuilder::new(base.clone(), &settings, services)
        .create_signed_archive(&ArchiveRequest::new(
            "repos/el/7/**/x86_64",
            "project-el-7-x86_64",
            VersioningMode::Version,
        ))
        .expect("archive builds");

    assert!(outcome.warning.is_none());
    let archive = version_dir.join("repos/project-el-7-x86_64.tar.gz");
    let metadata = std::fs::metadata(&archive).expect("archive exists");
    assert!(metadata.len() > 0);

    let listing = Command::new("tar")
        .args(["--list", "--gzip", "--file", archive.as_str()])
        .output()
        .expect("list archive");
    let listing = String::from_utf8_lossy(&listing.stdout);
    assert!(listing.contains("repos/el/7/products/x86_64/project-1.1.1-1.el7.x86_64.rpm"));

    // The process working directory is never changed by a build.
    assert_ne!(
        std::env::current_dir().expect("cwd"),
        version_dir.as_std_path()
    );
}

#[test]
fn missing_source_warns_then_tar_fails() {
    if !gnu_tar_available() {
        eprintln!("Skipping: GNU tar is not installed.");
        return;
    }

    let temp = TempDir::new().expect("temp dir");
    let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8 temp dir");
    let version_dir = base.join("pkg/project/1.1.1");
    std::fs::create_dir_all(version_dir.join("repos")).expect("create repos dir");

    let defaults = BuildDefaults {
        project: "project".to_owned(),
        version: Some("1.1.1".to_owned()),
        ..BuildDefaults::default()
    };
    let settings = BuildSettings::default();
    assert!(!settings.fail_on_missing_target);
    let services = ArchiveServices {
        locator: &PathToolLocator,
        versions: &defaults,
        probe: &GlobProbe,
        executor: &ShellExecutor,
    };

    // The missing source is only a warning, but tar has nothing to read.
    let err = ArchiveBuilder::new(base, &settings, services)
        .create_signed_archive(&ArchiveRequest::new(
            "repos/el/8/**/x86_64",
            "project-el-8-x86_64",
            VersioningMode::Version,
        ))
        .expect_err("tar fails on the missing source");

    match err {
        PublishError::ToolExecutionFailure { code, stderr, .. } => {
            assert_ne!(code, 0);
            assert!(stderr.contains("repos/el/8"), "unexpected stderr: {stderr}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
