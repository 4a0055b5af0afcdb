use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use wpforge_build::extract::{ExtractError, replace_extracted_tree};
use wpforge_core::{ArtifactConfig, FailureKind};

/// Write a gzip tarball at `dest` containing `files` (path, content).
fn write_tarball(dest: &Path, files: &[(&str, &str)]) {
    let file = std::fs::File::create(dest).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

#[test]
fn extracts_into_workdir() {
    let tmp = TempDir::new().unwrap();
    write_tarball(
        &tmp.path().join("latest.tar.gz"),
        &[
            ("wordpress/index.php", "<?php // index"),
            ("wordpress/wp-includes/version.php", "<?php $wp_version = '5.0.3';"),
        ],
    );

    replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap();

    let index = std::fs::read_to_string(tmp.path().join("wordpress/index.php")).unwrap();
    assert_eq!(index, "<?php // index");
    assert!(tmp.path().join("wordpress/wp-includes/version.php").exists());
}

#[test]
fn previous_tree_is_replaced() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("wordpress/wp-content")).unwrap();
    std::fs::write(tmp.path().join("wordpress/wp-content/stale.txt"), "old").unwrap();
    write_tarball(
        &tmp.path().join("latest.tar.gz"),
        &[("wordpress/index.php", "new")],
    );

    replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap();

    assert!(!tmp.path().join("wordpress/wp-content/stale.txt").exists());
    assert!(tmp.path().join("wordpress/index.php").exists());
}

#[test]
fn running_twice_gives_same_tree() {
    let tmp = TempDir::new().unwrap();
    write_tarball(
        &tmp.path().join("latest.tar.gz"),
        &[("wordpress/index.php", "same")],
    );

    replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap();
    replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap();

    let entries: Vec<_> = std::fs::read_dir(tmp.path().join("wordpress"))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn corrupt_archive_is_reported() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("latest.tar.gz"), b"definitely not gzip").unwrap();

    let err = replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap_err();

    assert!(matches!(err, ExtractError::ArchiveCorrupt { .. }));
    assert_eq!(err.kind(), FailureKind::ArchiveCorrupt);
}

#[test]
fn missing_archive_is_reported() {
    let tmp = TempDir::new().unwrap();
    let err = replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap_err();

    assert!(matches!(err, ExtractError::Open { .. }));
}

#[test]
fn archive_without_expected_tree() {
    let tmp = TempDir::new().unwrap();
    write_tarball(
        &tmp.path().join("latest.tar.gz"),
        &[("drupal/index.php", "wrong project")],
    );

    let err = replace_extracted_tree(&ArtifactConfig::default(), tmp.path()).unwrap_err();

    assert!(matches!(err, ExtractError::MissingTree { .. }));
    assert_eq!(err.kind(), FailureKind::ArchiveCorrupt);
}
