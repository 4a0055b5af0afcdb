use wpforge_core::FailureKind;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{program} not found on PATH")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        program: String,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),
}

impl EngineError {
    pub fn kind(&self) -> FailureKind {
        FailureKind::ExternalToolFailure
    }
}
