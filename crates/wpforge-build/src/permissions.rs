use std::path::{Path, PathBuf};
use wpforge_core::{FailureKind, PermissionConfig};
use wpforge_engine::{ContainerEngine, EngineError, RunSpec};

/// Container spec that recursively gives `settings.group` to the mounted tree.
pub fn chown_spec(tree: &Path, settings: &PermissionConfig) -> RunSpec {
    let mount = settings.mount_point.trim_end_matches('/');
    RunSpec::new(settings.image.clone())
        .volume(tree, mount)
        .command([
            "chown".to_owned(),
            "-R".to_owned(),
            format!(":{}", settings.group),
            format!("{mount}/"),
        ])
}

/// Normalize group ownership of `tree` through a throwaway container.
pub async fn normalize_ownership<C: ContainerEngine>(
    engine: &C,
    tree: &Path,
    settings: &PermissionConfig,
) -> Result<(), PermissionError> {
    // Bind mounts need an absolute host path.
    let absolute = tree.canonicalize().map_err(|e| PermissionError::Resolve {
        path: tree.to_path_buf(),
        source: e,
    })?;

    let spec = chown_spec(&absolute, settings);
    tracing::debug!(?spec, "normalizing ownership");

    engine
        .run_container(&spec)
        .await
        .map_err(|e| PermissionError::Engine {
            path: absolute.clone(),
            source: e,
        })?;

    tracing::info!(path = %absolute.display(), group = %settings.group, "ownership normalized");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("failed to resolve tree path {path}")]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("container engine failed to chown {path}")]
    Engine { path: PathBuf, source: EngineError },
}

impl PermissionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PermissionError::Resolve { .. } => FailureKind::Io,
            PermissionError::Engine { source, .. } => source.kind(),
        }
    }
}
