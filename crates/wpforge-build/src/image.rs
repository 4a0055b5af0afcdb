use crate::directive;
use std::path::{Path, PathBuf};
use wpforge_core::{FailureKind, RecipeConfig};
use wpforge_engine::{ContainerEngine, EngineError, SourceControl};

/// Reference of the customized image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub repository: String,
    pub tag: String,
}

impl std::fmt::Display for ImageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Clones the upstream image recipe, overlays local files, patches the
/// build directive, and builds the customized image.
///
/// Every run starts from a fresh clone.
pub struct ImageCustomizer<'a, C, S> {
    recipe: &'a RecipeConfig,
    workdir: &'a Path,
    engine: &'a C,
    scm: &'a S,
}

impl<'a, C: ContainerEngine, S: SourceControl> ImageCustomizer<'a, C, S> {
    pub fn new(recipe: &'a RecipeConfig, workdir: &'a Path, engine: &'a C, scm: &'a S) -> Self {
        Self {
            recipe,
            workdir,
            engine,
            scm,
        }
    }

    fn clone_dir(&self) -> PathBuf {
        self.workdir.join(&self.recipe.clone_dir)
    }

    /// Directory the overlay files land in and the image is built from.
    pub fn files_root(&self) -> PathBuf {
        self.clone_dir().join(&self.recipe.files_root)
    }

    /// Run the whole customization; `enable_extra` adds the extra overlay files.
    pub async fn build_custom_image(&self, enable_extra: bool) -> Result<ImageTag, ImageError> {
        let clone_dir = self.clone_dir();

        remove_stale_clone(&clone_dir)?;

        tracing::info!(
            repository = %self.recipe.repository,
            dest = %clone_dir.display(),
            "cloning image recipe"
        );
        self.scm
            .clone_repo(&self.recipe.repository, &clone_dir)
            .await
            .map_err(|e| ImageError::Clone {
                repository: self.recipe.repository.clone(),
                source: e,
            })?;

        let files_root = self.files_root();
        let mut overlays: Vec<&PathBuf> = self.recipe.overlay_files.iter().collect();
        if enable_extra {
            overlays.extend(&self.recipe.extra_overlay_files);
        }
        for file in overlays {
            self.copy_overlay(file, &files_root)?;
        }

        let version = self.resolve_version(&files_root);
        let image = ImageTag {
            repository: self.recipe.image_name.clone(),
            tag: format!("{version}{suffix}", suffix = self.recipe.tag_suffix),
        };

        tracing::info!(%image, "building image");
        self.engine
            .build_image(&files_root, &image.to_string())
            .await
            .map_err(|e| ImageError::Build {
                image: image.to_string(),
                source: e,
            })?;

        Ok(image)
    }

    fn copy_overlay(&self, file: &Path, files_root: &Path) -> Result<(), ImageError> {
        let src = self.workdir.join(file);
        let name = file
            .file_name()
            .ok_or_else(|| ImageError::InvalidOverlay(file.to_path_buf()))?;
        let dst = files_root.join(name);

        std::fs::copy(&src, &dst).map_err(|e| ImageError::Overlay {
            path: src.clone(),
            source: e,
        })?;
        tracing::debug!(src = %src.display(), dst = %dst.display(), "overlay copied");
        Ok(())
    }

    /// Patch the directive and pick the version to tag with.
    ///
    /// Any directive failure, or a directive without a version line, falls
    /// back to the default version.
    fn resolve_version(&self, files_root: &Path) -> String {
        let path = files_root.join(&self.recipe.directive_file);

        match directive::rewrite_file(&path, &self.recipe.entrypoint_line) {
            Ok(rewrite) => match rewrite.version {
                Some(version) => version,
                None => {
                    tracing::warn!(
                        path = %path.display(),
                        default = %self.recipe.default_version,
                        "no image version in build directive; using default"
                    );
                    self.recipe.default_version.clone()
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = %e.kind(),
                    default = %self.recipe.default_version,
                    "build directive unusable; using default version"
                );
                self.recipe.default_version.clone()
            }
        }
    }
}

fn remove_stale_clone(clone_dir: &Path) -> Result<(), ImageError> {
    if !clone_dir.exists() {
        return Ok(());
    }

    tracing::debug!(path = %clone_dir.display(), "removing stale recipe clone");
    std::fs::remove_dir_all(clone_dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ImageError::PermissionDenied {
                path: clone_dir.to_path_buf(),
                source: e,
            }
        } else {
            ImageError::Cleanup {
                path: clone_dir.to_path_buf(),
                source: e,
            }
        }
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("unable to remove stale clone {path}: permission denied")]
    PermissionDenied {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove stale clone {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to clone {repository}")]
    Clone {
        repository: String,
        source: EngineError,
    },

    #[error("overlay path has no file name: {0}")]
    InvalidOverlay(PathBuf),

    #[error("failed to copy overlay file {path}")]
    Overlay {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to build image {image}")]
    Build { image: String, source: EngineError },
}

impl ImageError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ImageError::PermissionDenied { .. } => FailureKind::FilesystemPermissionDenied,
            ImageError::Cleanup { .. } | ImageError::Overlay { .. } => FailureKind::Io,
            ImageError::InvalidOverlay(_) => FailureKind::Configuration,
            ImageError::Clone { source, .. } | ImageError::Build { source, .. } => source.kind(),
        }
    }
}
