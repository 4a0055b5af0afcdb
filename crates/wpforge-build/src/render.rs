use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use wpforge_core::{FailureKind, RenderConfig, VariableContext};

/// Main configuration file template.
pub const CONFIG_TEMPLATE: &str = "wp-config.php";
/// First-run automation script template.
pub const AUTOMATION_TEMPLATE: &str = "wp_automate.php";
/// Multisite rewrite rules template.
pub const MULTISITE_TEMPLATE: &str = "htaccess";

/// One template rendered to one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateJob {
    pub template: String,
    pub output: PathBuf,
}

impl TemplateJob {
    pub fn new(template: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            output: output.into(),
        }
    }
}

/// Feature flags that add context keys and jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub multisite: bool,
    /// Only has an effect together with `multisite`.
    pub subdomain: bool,
}

/// The fixed job list, plus the rewrite rules when multisite is on.
///
/// Outputs are relative to the working directory; `site_dir` is the
/// extracted tree.
pub fn render_jobs(options: &RenderOptions, site_dir: &Path) -> Vec<TemplateJob> {
    let mut jobs = vec![
        TemplateJob::new(CONFIG_TEMPLATE, site_dir.join("wp-config.php")),
        TemplateJob::new(AUTOMATION_TEMPLATE, "wp_automate.php"),
    ];
    if options.multisite {
        jobs.push(TemplateJob::new(MULTISITE_TEMPLATE, site_dir.join(".htaccess")));
    }
    jobs
}

/// Tera context for the variables plus the `multisite`/`subdomain` flags.
pub fn template_context(vars: &VariableContext, options: &RenderOptions) -> Context {
    let mut context = Context::new();
    for (key, value) in vars.iter() {
        context.insert(key, value);
    }
    context.insert("multisite", &options.multisite);
    context.insert("subdomain", &(options.multisite && options.subdomain));
    context
}

/// Renders `<templates_dir>/<name><suffix>` templates to files.
pub struct TemplateRenderer {
    templates_dir: PathBuf,
    suffix: String,
    workdir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(config: &RenderConfig, workdir: &Path) -> Self {
        Self {
            templates_dir: workdir.join(&config.templates_dir),
            suffix: config.template_suffix.clone(),
            workdir: workdir.to_path_buf(),
        }
    }

    pub fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir.join(format!("{name}{}", self.suffix))
    }

    /// Render every job in order, stopping at the first failure.
    ///
    /// Files written before a failing job are left in place. Returns the
    /// paths written.
    pub fn render(
        &self,
        jobs: &[TemplateJob],
        vars: &VariableContext,
        options: &RenderOptions,
    ) -> Result<Vec<PathBuf>, RenderError> {
        let context = template_context(vars, options);
        let mut written = Vec::with_capacity(jobs.len());

        for job in jobs {
            let rendered = self.render_one(&job.template, &context)?;
            let output = self.workdir.join(&job.output);

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).map_err(|e| RenderError::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            std::fs::write(&output, rendered).map_err(|e| RenderError::Write {
                path: output.clone(),
                source: e,
            })?;

            tracing::info!(
                template = %job.template,
                output = %output.display(),
                "template rendered"
            );
            written.push(output);
        }

        Ok(written)
    }

    fn render_one(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        let path = self.template_path(name);
        let source = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RenderError::TemplateMissing {
                    name: name.to_owned(),
                    path: path.clone(),
                }
            } else {
                RenderError::Read {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let mut tera = Tera::default();
        tera.add_raw_template(name, &source)
            .map_err(|e| RenderError::Render {
                name: name.to_owned(),
                source: e,
            })?;
        tera.render(name, context).map_err(|e| RenderError::Render {
            name: name.to_owned(),
            source: e,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template {name} not found at {path}")]
    TemplateMissing { name: String, path: PathBuf },

    #[error("failed to read template {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render template {name}")]
    Render { name: String, source: tera::Error },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RenderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RenderError::TemplateMissing { .. } => FailureKind::TemplateMissing,
            RenderError::Render { .. } => FailureKind::Configuration,
            RenderError::Read { .. } | RenderError::Write { .. } => FailureKind::Io,
        }
    }
}
