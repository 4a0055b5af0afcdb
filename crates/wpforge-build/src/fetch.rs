use crate::checksum::{self, ChecksumError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wpforge_core::{ArtifactConfig, FailureKind};

/// How the local tarball ended up current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The cached copy already matched the published checksum.
    UpToDate,
    /// A fresh copy was downloaded and verified.
    Downloaded,
    /// The checksum could not be fetched; the cached copy is used unverified.
    UsingCached,
}

/// Keeps the local tarball in sync with the published checksum.
pub struct Fetcher<'a> {
    client: reqwest::Client,
    artifact: &'a ArtifactConfig,
    local: PathBuf,
}

impl<'a> Fetcher<'a> {
    pub fn new(
        artifact: &'a ArtifactConfig,
        workdir: &Path,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client { source: e })?;

        Ok(Self {
            client,
            artifact,
            local: workdir.join(&artifact.file),
        })
    }

    /// Path of the cached tarball.
    pub fn local_path(&self) -> &Path {
        &self.local
    }

    /// Make sure the local tarball matches the latest published checksum.
    ///
    /// Downloads only when the cached copy is missing or stale, and verifies
    /// the download once. When the checksum itself cannot be fetched, an
    /// existing cached copy is used as-is; without one the run fails.
    pub async fn ensure_latest(&self) -> Result<FetchOutcome, FetchError> {
        let reference = match self.fetch_reference().await {
            Ok(reference) => reference,
            Err(e @ FetchError::Network { .. }) if self.local.exists() => {
                tracing::warn!(
                    error = %e,
                    path = %self.local.display(),
                    "unable to fetch checksum; using the current file"
                );
                return Ok(FetchOutcome::UsingCached);
            }
            Err(e) => return Err(e),
        };

        if self.local.exists() {
            if checksum::matches(&self.local, &reference)? {
                tracing::info!(path = %self.local.display(), "cached tarball is current");
                return Ok(FetchOutcome::UpToDate);
            }
            tracing::info!(path = %self.local.display(), "cached tarball checksum does not match");
        }

        self.download().await?;

        let actual = checksum::file_digest(&self.local)?;
        if actual != reference {
            return Err(FetchError::ChecksumMismatch {
                path: self.local.clone(),
                expected: reference,
                actual,
            });
        }

        tracing::info!(path = %self.local.display(), "downloaded tarball verified");
        Ok(FetchOutcome::Downloaded)
    }

    async fn fetch_reference(&self) -> Result<String, FetchError> {
        let url = &self.artifact.checksum_url;
        tracing::debug!(%url, "fetching reference checksum");

        let body = self
            .get(url)
            .await?
            .text()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                source: e,
            })?;

        Ok(body.trim().to_owned())
    }

    async fn download(&self) -> Result<(), FetchError> {
        let url = &self.artifact.url;
        tracing::info!(%url, path = %self.local.display(), "downloading tarball");

        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                source: e,
            })?;

        if let Some(parent) = self.local.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FetchError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&self.local, &bytes).map_err(|e| FetchError::Write {
            path: self.local.clone(),
            source: e,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FetchError::Network {
                url: url.to_owned(),
                source: e,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client")]
    Client { source: reqwest::Error },

    #[error("request to {url} failed")]
    Network { url: String, source: reqwest::Error },

    #[error("unable to get {path} matching {expected} (got {actual})")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Client { .. } => FailureKind::Configuration,
            FetchError::Network { .. } => FailureKind::NetworkFailure,
            FetchError::ChecksumMismatch { .. } => FailureKind::ChecksumMismatch,
            FetchError::Checksum(e) => e.kind(),
            FetchError::Write { .. } => FailureKind::Io,
        }
    }
}
