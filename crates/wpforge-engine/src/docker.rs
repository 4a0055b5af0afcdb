use crate::error::EngineError;
use crate::executor::{CommandExecutor, RealExecutor};
use std::path::{Path, PathBuf};

/// Container engine capability used by the provisioning stages.
///
/// Production code uses [`DockerCli`]; tests inject doubles implementing
/// the same two operations.
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Run a throwaway container to completion.
    async fn run_container(&self, spec: &RunSpec) -> Result<(), EngineError>;

    /// Build an image from `context_dir` and tag it.
    async fn build_image(&self, context_dir: &Path, tag: &str) -> Result<(), EngineError>;
}

/// A host directory bind-mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub host: PathBuf,
    pub guest: String,
}

/// What to run, and with which mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub volumes: Vec<VolumeBinding>,
    pub command: Vec<String>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            volumes: Vec::new(),
            command: Vec::new(),
        }
    }

    pub fn volume(mut self, host: impl Into<PathBuf>, guest: impl Into<String>) -> Self {
        self.volumes.push(VolumeBinding {
            host: host.into(),
            guest: guest.into(),
        });
        self
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }
}

/// `docker` CLI client, parameterized over the executor for testability.
pub struct DockerCli<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl DockerCli<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerCli<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerCli<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Argument vector for `docker run`; the container is always removed on exit.
    pub fn run_args(spec: &RunSpec) -> Result<Vec<String>, EngineError> {
        let mut args = vec!["run".to_owned(), "--rm".to_owned()];
        for volume in &spec.volumes {
            let host = volume
                .host
                .to_str()
                .ok_or_else(|| EngineError::InvalidPath(volume.host.clone()))?;
            args.push("-v".to_owned());
            args.push(format!("{host}:{guest}", guest = volume.guest));
        }
        args.push(spec.image.clone());
        args.extend(spec.command.iter().cloned());
        Ok(args)
    }
}

impl<E: CommandExecutor> ContainerEngine for DockerCli<E> {
    async fn run_container(&self, spec: &RunSpec) -> Result<(), EngineError> {
        let args = Self::run_args(spec)?;
        self.executor.exec("docker", &args).await?;
        Ok(())
    }

    async fn build_image(&self, context_dir: &Path, tag: &str) -> Result<(), EngineError> {
        let dir = context_dir
            .to_str()
            .ok_or_else(|| EngineError::InvalidPath(context_dir.to_path_buf()))?;

        self.executor
            .exec_streaming("docker", &args(["build", "-t", tag, dir]))
            .await
    }
}

pub(crate) fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
