use crate::docker::args;
use crate::error::EngineError;
use crate::executor::{CommandExecutor, RealExecutor};
use std::path::Path;

/// Source control capability: only cloning is needed.
#[allow(async_fn_in_trait)]
pub trait SourceControl {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), EngineError>;
}

/// `git` CLI client.
pub struct GitCli<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl GitCli<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for GitCli<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> GitCli<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: CommandExecutor> SourceControl for GitCli<E> {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), EngineError> {
        let dest_str = dest
            .to_str()
            .ok_or_else(|| EngineError::InvalidPath(dest.to_path_buf()))?;

        self.executor
            .exec_streaming(
                "git",
                &args(["clone", "--depth", "1", "--quiet", url, dest_str]),
            )
            .await
    }
}
