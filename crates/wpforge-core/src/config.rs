use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "wpforge.toml";

/// wpforge.toml configuration
///
/// Built once at start-up and handed to each stage by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionConfig {
    #[serde(default)]
    pub artifact: ArtifactConfig,
    #[serde(default)]
    pub permissions: PermissionConfig,
    #[serde(default)]
    pub recipe: RecipeConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// The reference artifact kept in sync with its published checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Local cache file for the tarball
    #[serde(default = "default_artifact_file")]
    pub file: PathBuf,
    /// Tarball download URL
    #[serde(default = "default_artifact_url")]
    pub url: String,
    /// URL serving the raw hex MD5 digest of the tarball
    #[serde(default = "default_checksum_url")]
    pub checksum_url: String,
    /// Directory the tarball extracts into
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Image used for the throwaway chown container
    #[serde(default = "default_permission_image")]
    pub image: String,
    /// Group given to every file of the extracted tree
    #[serde(default = "default_group")]
    pub group: String,
    /// Where the tree is mounted inside the container
    #[serde(default = "default_mount_point")]
    pub mount_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeConfig {
    /// Upstream image recipe repository
    #[serde(default = "default_recipe_repository")]
    pub repository: String,
    /// Local clone location (deleted at the start of every build)
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,
    /// Directory inside the clone holding the Dockerfile and image files
    #[serde(default = "default_files_root")]
    pub files_root: PathBuf,
    /// Files copied into the files root on every build
    #[serde(default = "default_overlay_files")]
    pub overlay_files: Vec<PathBuf>,
    /// Files copied only when multisite is enabled
    #[serde(default = "default_extra_overlay_files")]
    pub extra_overlay_files: Vec<PathBuf>,
    /// Build directive file name
    #[serde(default = "default_directive_file")]
    pub directive_file: String,
    /// Replacement for the recipe's ENTRYPOINT line
    #[serde(default = "default_entrypoint_line")]
    pub entrypoint_line: String,
    /// Repository part of the built image reference
    #[serde(default = "default_image_name")]
    pub image_name: String,
    /// Appended to the discovered version to form the image tag
    #[serde(default = "default_tag_suffix")]
    pub tag_suffix: String,
    /// Version used when the directive file cannot be read
    #[serde(default = "default_version")]
    pub default_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Deployment descriptor scanned for variables
    #[serde(default = "default_descriptor")]
    pub descriptor: PathBuf,
    /// Directory holding the templates
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    /// Appended to a template name to form its file name
    #[serde(default = "default_template_suffix")]
    pub template_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for checksum and tarball downloads
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            file: default_artifact_file(),
            url: default_artifact_url(),
            checksum_url: default_checksum_url(),
            dir: default_artifact_dir(),
        }
    }
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            image: default_permission_image(),
            group: default_group(),
            mount_point: default_mount_point(),
        }
    }
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            repository: default_recipe_repository(),
            clone_dir: default_clone_dir(),
            files_root: default_files_root(),
            overlay_files: default_overlay_files(),
            extra_overlay_files: default_extra_overlay_files(),
            directive_file: default_directive_file(),
            entrypoint_line: default_entrypoint_line(),
            image_name: default_image_name(),
            tag_suffix: default_tag_suffix(),
            default_version: default_version(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            descriptor: default_descriptor(),
            templates_dir: default_templates_dir(),
            template_suffix: default_template_suffix(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProvisionConfig {
    /// Load from wpforge.toml in the given directory, or return defaults if not found.
    pub fn load(workdir: &Path) -> crate::Result<Self> {
        let config_path = workdir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file; using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(crate::Error::InvalidValue {
                field: "http.timeout_secs",
                reason: "must be greater than zero".to_owned(),
            });
        }
        if self.render.template_suffix.is_empty() {
            return Err(crate::Error::InvalidValue {
                field: "render.template_suffix",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.recipe.directive_file.contains('/') {
            return Err(crate::Error::InvalidValue {
                field: "recipe.directive_file",
                reason: format!(
                    "{:?} must be a file name, not a path",
                    self.recipe.directive_file
                ),
            });
        }
        Ok(())
    }
}

fn default_artifact_file() -> PathBuf {
    PathBuf::from("latest.tar.gz")
}

fn default_artifact_url() -> String {
    "https://wordpress.org/latest.tar.gz".to_owned()
}

fn default_checksum_url() -> String {
    "https://wordpress.org/latest.tar.gz.md5".to_owned()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("wordpress")
}

fn default_permission_image() -> String {
    "ubuntu:latest".to_owned()
}

fn default_group() -> String {
    "daemon".to_owned()
}

fn default_mount_point() -> String {
    "/app".to_owned()
}

fn default_recipe_repository() -> String {
    "https://github.com/bitnami/bitnami-docker-wordpress.git".to_owned()
}

fn default_clone_dir() -> PathBuf {
    PathBuf::from("bitnami-docker-wordpress")
}

fn default_files_root() -> PathBuf {
    PathBuf::from("5/debian-9")
}

fn default_overlay_files() -> Vec<PathBuf> {
    vec![
        PathBuf::from("wp_automate.php"),
        PathBuf::from("files/custom-entrypoint.sh"),
    ]
}

fn default_extra_overlay_files() -> Vec<PathBuf> {
    vec![PathBuf::from("wordpress/.htaccess")]
}

fn default_directive_file() -> String {
    "Dockerfile".to_owned()
}

fn default_entrypoint_line() -> String {
    r#"ENTRYPOINT [ "/custom-entrypoint.sh" ]"#.to_owned()
}

fn default_image_name() -> String {
    "bitnami/wordpress".to_owned()
}

fn default_tag_suffix() -> String {
    "-custom".to_owned()
}

fn default_version() -> String {
    "5.0.3-r1".to_owned()
}

fn default_descriptor() -> PathBuf {
    PathBuf::from("docker-compose.yml")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_template_suffix() -> String {
    ".j2".to_owned()
}

fn default_timeout_secs() -> u64 {
    300
}
