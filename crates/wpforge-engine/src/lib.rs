pub mod docker;
pub mod error;
pub mod executor;
pub mod git;

pub use docker::{ContainerEngine, DockerCli, RunSpec, VolumeBinding};
pub use error::EngineError;
pub use executor::{CommandExecutor, RealExecutor};
pub use git::{GitCli, SourceControl};
