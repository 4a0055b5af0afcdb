//! Build directive (Dockerfile) patching.
//!
//! The recipe's ENTRYPOINT is swapped for the custom one, and the upstream
//! image version is read from its `BITNAMI_IMAGE_VERSION="..."` line.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use wpforge_core::FailureKind;

/// Suffix given to the untouched copy of the directive file.
pub const BACKUP_SUFFIX: &str = ".orig";

const ENTRYPOINT_MARKER: &str = "ENTRYPOINT";

static VERSION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"BITNAMI_IMAGE_VERSION="([^"]*)""#).expect("version pattern is valid")
});

/// Result of rewriting a directive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveRewrite {
    pub content: String,
    /// Last version found, if any.
    pub version: Option<String>,
    pub entrypoints_replaced: usize,
}

/// Rewrite directive text line by line.
///
/// Each line keeps its own terminator (`\n`, `\r\n` or none).
pub fn rewrite(content: &str, entrypoint_line: &str) -> DirectiveRewrite {
    let mut version = None;
    let mut entrypoints_replaced = 0;
    let mut rewritten = String::with_capacity(content.len());

    for raw in content.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\r', '\n']);
        let ending = &raw[line.len()..];

        if is_entrypoint(line) {
            rewritten.push_str(entrypoint_line);
            rewritten.push_str(ending);
            entrypoints_replaced += 1;
            continue;
        }
        if let Some(caps) = VERSION_MARKER.captures(line) {
            version = Some(caps[1].to_owned());
        }
        rewritten.push_str(raw);
    }

    DirectiveRewrite {
        content: rewritten,
        version,
        entrypoints_replaced,
    }
}

/// Instructions are case-insensitive.
fn is_entrypoint(line: &str) -> bool {
    line.trim_start()
        .get(..ENTRYPOINT_MARKER.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(ENTRYPOINT_MARKER))
}

/// Backup path for a directive file: `Dockerfile` -> `Dockerfile.orig`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Move the directive file aside and write the rewritten version in its place.
///
/// If the backup cannot be read or the rewrite cannot be written, the
/// original file is moved back before the error is returned.
pub fn rewrite_file(
    path: &Path,
    entrypoint_line: &str,
) -> Result<DirectiveRewrite, DirectiveError> {
    let backup = backup_path(path);
    std::fs::rename(path, &backup).map_err(|e| DirectiveError::NotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let original = match std::fs::read_to_string(&backup) {
        Ok(original) => original,
        Err(e) => {
            restore(&backup, path);
            return Err(DirectiveError::Read {
                path: backup,
                source: e,
            });
        }
    };

    let rewrite = rewrite(&original, entrypoint_line);
    if let Err(e) = std::fs::write(path, &rewrite.content) {
        restore(&backup, path);
        return Err(DirectiveError::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }

    tracing::debug!(
        path = %path.display(),
        version = ?rewrite.version,
        entrypoints = rewrite.entrypoints_replaced,
        "directive rewritten"
    );
    Ok(rewrite)
}

fn restore(backup: &Path, path: &Path) {
    if let Err(e) = std::fs::rename(backup, path) {
        tracing::warn!(
            backup = %backup.display(),
            path = %path.display(),
            error = %e,
            "unable to restore build directive"
        );
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("build directive {path} not found")]
    NotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl DirectiveError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DirectiveError::NotFound { .. } => FailureKind::ConfigDirectiveNotFound,
            DirectiveError::Read { .. } | DirectiveError::Write { .. } => FailureKind::Io,
        }
    }
}
