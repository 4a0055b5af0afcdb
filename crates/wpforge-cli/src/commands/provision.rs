use crate::pipeline::{self, Outcome, StageError, Stages};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use wpforge_build::{extract, permissions, render};
use wpforge_build::{FetchOutcome, Fetcher, ImageCustomizer, RenderOptions, TemplateRenderer};
use wpforge_core::{Credentials, ProvisionConfig, resolve_context};
use wpforge_engine::{ContainerEngine, DockerCli, GitCli, SourceControl};

/// Run the provisioning pipeline in the current directory.
pub async fn provision(alternate: bool, options: RenderOptions) -> anyhow::Result<ExitCode> {
    let workdir = PathBuf::from(".");
    let config = match ProvisionConfig::load(&workdir) {
        Ok(config) => config,
        Err(e) => {
            let kind = e.kind();
            eprintln!(
                "Error: loading configuration failed ({kind}): {:#}",
                anyhow::Error::from(e)
            );
            println!("Giving up.");
            return Ok(ExitCode::FAILURE);
        }
    };
    let engine = DockerCli::new();
    let scm = GitCli::new();

    let mut stages = ProvisionStages {
        config: &config,
        workdir: &workdir,
        options,
        engine: &engine,
        scm: &scm,
    };
    let report = pipeline::run(&mut stages, alternate).await;
    tracing::debug!(
        succeeded = report.succeeded(),
        completed = report.completed.len(),
        "pipeline finished"
    );

    let completed: Vec<&str> = report.completed.iter().map(|s| s.label()).collect();
    match report.outcome {
        Outcome::Done(credentials) => {
            println!();
            println!("Completed: {}", completed.join(", "));
            println!("Provisioning complete.");
            println!("{credentials}");
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Failed { stage, failure } => {
            eprintln!(
                "Error: {} failed ({}): {:#}",
                stage.label(),
                failure.kind,
                failure.error
            );
            println!("Giving up.");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Production stages over the real container engine and source control.
struct ProvisionStages<'a, C, S> {
    config: &'a ProvisionConfig,
    workdir: &'a Path,
    options: RenderOptions,
    engine: &'a C,
    scm: &'a S,
}

impl<C: ContainerEngine, S: SourceControl> ProvisionStages<'_, C, S> {
    fn site_dir(&self) -> PathBuf {
        self.workdir.join(&self.config.artifact.dir)
    }

    fn descriptor(&self) -> PathBuf {
        self.workdir.join(&self.config.render.descriptor)
    }
}

impl<C: ContainerEngine, S: SourceControl> Stages for ProvisionStages<'_, C, S> {
    async fn fetch(&mut self) -> Result<(), StageError> {
        let timeout = Duration::from_secs(self.config.http.timeout_secs);
        let fetcher = Fetcher::new(&self.config.artifact, self.workdir, timeout)
            .map_err(|e| StageError::new(e.kind(), e))?;

        let outcome = fetcher
            .ensure_latest()
            .await
            .map_err(|e| StageError::new(e.kind(), e))?;

        match outcome {
            FetchOutcome::UpToDate => println!("  Tarball is up to date"),
            FetchOutcome::Downloaded => println!("  Downloaded {}", fetcher.local_path().display()),
            FetchOutcome::UsingCached => {
                println!("  Checksum unavailable, using {}", fetcher.local_path().display())
            }
        }
        Ok(())
    }

    async fn extract(&mut self) -> Result<(), StageError> {
        extract::replace_extracted_tree(&self.config.artifact, self.workdir)
            .map_err(|e| StageError::new(e.kind(), e))
    }

    async fn fix_permissions(&mut self) -> Result<(), StageError> {
        permissions::normalize_ownership(self.engine, &self.site_dir(), &self.config.permissions)
            .await
            .map_err(|e| StageError::new(e.kind(), e))
    }

    async fn render(&mut self) -> Result<(), StageError> {
        let vars = resolve_context(&self.descriptor()).map_err(|e| StageError::new(e.kind(), e))?;
        let jobs = render::render_jobs(&self.options, &self.config.artifact.dir);

        let written = TemplateRenderer::new(&self.config.render, self.workdir)
            .render(&jobs, &vars, &self.options)
            .map_err(|e| StageError::new(e.kind(), e))?;

        for path in written {
            println!("  Wrote {}", path.display());
        }
        Ok(())
    }

    async fn build_image(&mut self) -> Result<(), StageError> {
        let image = ImageCustomizer::new(&self.config.recipe, self.workdir, self.engine, self.scm)
            .build_custom_image(self.options.multisite)
            .await
            .map_err(|e| StageError::new(e.kind(), e))?;

        println!("  Built {image}");
        Ok(())
    }

    fn credentials(&self) -> Result<Credentials, StageError> {
        resolve_context(&self.descriptor())
            .map(|vars| vars.credentials())
            .map_err(|e| StageError::new(e.kind(), e))
    }
}
