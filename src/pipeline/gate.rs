// src/pipeline/gate.rs
use crate::models::Publication;
use crate::pipeline::state::{RunSnapshot, StepStatus};
use crate::pipeline::steps::{CODE_ARTIFACT, URL_ARTIFACT};
use thiserror::Error;

/// Why a finished run's artifacts cannot be handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("step `{0}` did not finish successfully")]
    StepNotSuccessful(String),
    #[error("published gallery URL missing from run artifacts")]
    MissingUrl,
    #[error("generated gallery code missing from run artifacts")]
    MissingCode,
}

/// The completion gate: a run's artifacts are authoritative only when every
/// step reached `Success` and the publish step actually yielded a non-empty
/// URL. Pure policy over a snapshot: no I/O, independently testable.
pub fn confirm(snapshot: &RunSnapshot) -> Result<Publication, GateError> {
    if let Some(step) = snapshot
        .steps
        .iter()
        .find(|s| s.status != StepStatus::Success)
    {
        return Err(GateError::StepNotSuccessful(step.id.clone()));
    }

    let url = snapshot
        .artifact(URL_ARTIFACT)
        .filter(|url| !url.trim().is_empty())
        .ok_or(GateError::MissingUrl)?;

    let code = snapshot
        .artifact(CODE_ARTIFACT)
        .filter(|code| !code.trim().is_empty())
        .ok_or(GateError::MissingCode)?;

    Ok(Publication {
        code: code.to_string(),
        url: url.to_string(),
    })
}
