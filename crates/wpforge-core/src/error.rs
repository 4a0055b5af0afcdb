use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        FailureKind::Configuration
    }
}

/// Failure taxonomy shared by every provisioning stage.
///
/// Component errors map onto one of these through their `kind()` method so
/// the pipeline can report (and decide on) failures uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// DNS, connection, or HTTP status failure.
    NetworkFailure,
    /// Downloaded content does not match the published checksum.
    ChecksumMismatch,
    /// A stale directory could not be removed.
    FilesystemPermissionDenied,
    /// The tarball could not be read or unpacked.
    ArchiveCorrupt,
    /// `git` or the container engine failed or exited non-zero.
    ExternalToolFailure,
    /// A template file does not exist.
    TemplateMissing,
    /// The recipe's build directive file is missing.
    ConfigDirectiveNotFound,
    /// Invalid `wpforge.toml`, unreadable descriptor, or bad template content.
    Configuration,
    /// Any other local I/O failure.
    Io,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::NetworkFailure => "network failure",
            FailureKind::ChecksumMismatch => "checksum mismatch",
            FailureKind::FilesystemPermissionDenied => "permission denied",
            FailureKind::ArchiveCorrupt => "corrupt archive",
            FailureKind::ExternalToolFailure => "external tool failure",
            FailureKind::TemplateMissing => "template missing",
            FailureKind::ConfigDirectiveNotFound => "build directive not found",
            FailureKind::Configuration => "configuration error",
            FailureKind::Io => "I/O error",
        };
        f.write_str(label)
    }
}
