//! Content checksums for the reference artifact.
//!
//! The upstream publishes a raw hex MD5 digest next to each tarball, so that
//! is what gets computed here.

use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use wpforge_core::FailureKind;

/// Lower-case hex MD5 digest of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Digest of the whole file at `path`.
pub fn file_digest(path: &Path) -> Result<String, ChecksumError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ChecksumError::FileNotFound(path.to_path_buf())
        } else {
            ChecksumError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    Ok(digest(&bytes))
}

/// Whether the file at `path` hashes to exactly `reference` (case-sensitive).
///
/// The file is expected to exist; a missing file is an error, not `false`.
pub fn matches(path: &Path, reference: &str) -> Result<bool, ChecksumError> {
    let actual = file_digest(path)?;
    tracing::debug!(path = %path.display(), %actual, reference, "checksum compared");
    Ok(actual == reference)
}

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ChecksumError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Io
    }
}
