use wpforge_core::{Credentials, FailureKind};

/// Pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Fetching,
    Extracting,
    FixingPerms,
    Rendering,
    ImageBuild,
    Done,
    Failed,
}

impl State {
    /// The state reached when the current one succeeds.
    ///
    /// `alternate` deployments go straight from rendering to done.
    pub(crate) fn next(self, alternate: bool) -> State {
        match self {
            State::Fetching => State::Extracting,
            State::Extracting => State::FixingPerms,
            State::FixingPerms => State::Rendering,
            State::Rendering if alternate => State::Done,
            State::Rendering => State::ImageBuild,
            State::ImageBuild => State::Done,
            State::Done | State::Failed => self,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            State::Fetching => "Fetching latest tarball",
            State::Extracting => "Extracting source tree",
            State::FixingPerms => "Fixing tree ownership",
            State::Rendering => "Rendering configuration",
            State::ImageBuild => "Building custom image",
            State::Done => "Done",
            State::Failed => "Failed",
        }
    }
}

/// A stage failure, tagged with its place in the failure taxonomy.
#[derive(Debug)]
pub(crate) struct StageError {
    pub kind: FailureKind,
    pub error: anyhow::Error,
}

impl StageError {
    pub(crate) fn new(kind: FailureKind, error: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }
}

/// One method per pipeline stage.
#[allow(async_fn_in_trait)]
pub(crate) trait Stages {
    async fn fetch(&mut self) -> Result<(), StageError>;
    async fn extract(&mut self) -> Result<(), StageError>;
    async fn fix_permissions(&mut self) -> Result<(), StageError>;
    async fn render(&mut self) -> Result<(), StageError>;
    async fn build_image(&mut self) -> Result<(), StageError>;
    /// Re-resolve the variables to report access details.
    fn credentials(&self) -> Result<Credentials, StageError>;
}

pub(crate) enum Outcome {
    Done(Credentials),
    /// `stage` is the state that was running when the failure happened.
    Failed { stage: State, failure: StageError },
}

pub(crate) struct PipelineReport {
    /// Terminal state: `Done` or `Failed`.
    pub state: State,
    /// Stages that ran to completion, in order.
    pub completed: Vec<State>,
    pub outcome: Outcome,
}

impl PipelineReport {
    fn finish(completed: Vec<State>, outcome: Outcome) -> Self {
        let state = match outcome {
            Outcome::Done(_) => State::Done,
            Outcome::Failed { .. } => State::Failed,
        };
        Self {
            state,
            completed,
            outcome,
        }
    }

    pub(crate) fn succeeded(&self) -> bool {
        self.state == State::Done
    }
}

/// Drive the stages in order, stopping at the first failure.
///
/// Nothing is retried or rolled back.
pub(crate) async fn run<S: Stages>(stages: &mut S, alternate: bool) -> PipelineReport {
    let mut completed = Vec::new();
    let mut state = State::Fetching;

    while state != State::Done {
        println!("{}...", state.label());
        let result = match state {
            State::Fetching => stages.fetch().await,
            State::Extracting => stages.extract().await,
            State::FixingPerms => stages.fix_permissions().await,
            State::Rendering => stages.render().await,
            State::ImageBuild => stages.build_image().await,
            State::Done | State::Failed => break,
        };

        match result {
            Ok(()) => {
                completed.push(state);
                state = state.next(alternate);
            }
            Err(failure) => {
                tracing::debug!(stage = ?state, kind = %failure.kind, "stage failed");
                return PipelineReport::finish(
                    completed,
                    Outcome::Failed {
                        stage: state,
                        failure,
                    },
                );
            }
        }
    }

    let outcome = match stages.credentials() {
        Ok(credentials) => Outcome::Done(credentials),
        Err(failure) => Outcome::Failed {
            stage: State::Done,
            failure,
        },
    };

    PipelineReport::finish(completed, outcome)
}
