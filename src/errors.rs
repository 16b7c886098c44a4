// src/errors.rs
use thiserror::Error;

/// Failure of a single pipeline step's remote call.
///
/// The variants only matter for logging; the runner treats every variant the
/// same way (mark the step failed, stop the run). Cancellation is not an
/// error: it is a distinct run outcome and never appears here.
#[derive(Debug, Error)]
pub enum StepError {
    /// The backend could not be reached at all (connect failure, timeout,
    /// non-2xx HTTP status).
    #[error("backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with an error envelope (`status: "error"`).
    #[error("{0}")]
    Remote(String),

    /// The backend answered success but the response body was undecodable or
    /// a required data field was absent or empty.
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// A step's payload referenced an artifact no earlier step produced.
    /// This indicates a registry ordering bug, not a backend problem.
    #[error("artifact `{0}` was not produced by an earlier step")]
    MissingArtifact(&'static str),
}

impl StepError {
    pub fn malformed(description: impl Into<String>) -> Self {
        StepError::Malformed(description.into())
    }
}

/// Service-level failures outside any single step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to build backend HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("pipeline run task failed: {0}")]
    RunTask(String),
}
