use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tar::Archive;
use wpforge_core::{ArtifactConfig, FailureKind};

/// Replace the extracted tree with the contents of the cached tarball.
///
/// The previous tree is deleted first. Entries are unpacked relative to
/// `workdir`, so the tarball's top-level directory must be `artifact.dir`.
/// A failed extraction is not rolled back.
pub fn replace_extracted_tree(
    artifact: &ArtifactConfig,
    workdir: &Path,
) -> Result<(), ExtractError> {
    let target = workdir.join(&artifact.dir);
    remove_tree(&target)?;

    let archive_path = workdir.join(&artifact.file);
    let file = File::open(&archive_path).map_err(|e| ExtractError::Open {
        path: archive_path.clone(),
        source: e,
    })?;

    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive
        .unpack(workdir)
        .map_err(|e| ExtractError::ArchiveCorrupt {
            path: archive_path.clone(),
            source: e,
        })?;

    if !target.is_dir() {
        return Err(ExtractError::MissingTree {
            archive: archive_path,
            expected: target,
        });
    }

    tracing::info!(
        archive = %archive_path.display(),
        target = %target.display(),
        "tarball extracted"
    );
    Ok(())
}

fn remove_tree(target: &Path) -> Result<(), ExtractError> {
    if !target.exists() {
        return Ok(());
    }

    tracing::debug!(path = %target.display(), "removing previous tree");
    std::fs::remove_dir_all(target).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ExtractError::PermissionDenied {
                path: target.to_path_buf(),
                source: e,
            }
        } else {
            ExtractError::Cleanup {
                path: target.to_path_buf(),
                source: e,
            }
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unable to remove old {path} directory: permission denied")]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove old {path} directory")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open tarball {path}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to extract the tarball {path}")]
    ArchiveCorrupt {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("tarball {archive} did not contain {expected}")]
    MissingTree { archive: PathBuf, expected: PathBuf },
}

impl ExtractError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractError::PermissionDenied { .. } => FailureKind::FilesystemPermissionDenied,
            ExtractError::Cleanup { .. } | ExtractError::Open { .. } => FailureKind::Io,
            ExtractError::ArchiveCorrupt { .. } | ExtractError::MissingTree { .. } => {
                FailureKind::ArchiveCorrupt
            }
        }
    }
}
