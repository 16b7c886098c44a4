// src/pipeline/mod.rs
pub mod cancel;
pub mod engine;
pub mod gate;
pub mod state;
pub mod steps;

pub use cancel::CancelController;
pub use engine::{PipelineEngine, RunReport};
pub use state::{RunSnapshot, RunState, StepSnapshot, StepStatus};
pub use steps::build_registry;

use crate::backend_client::GalleryBackend;
use crate::errors::StepError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Named values a step hands back to the runner on success.
pub type StepArtifacts = Vec<(String, String)>;

/// What a step sees while it executes: the backend to call and a read-only
/// view of the artifacts earlier steps produced. Steps never mutate run
/// state directly; they return artifacts and the runner merges them.
pub struct StepContext<'a> {
    pub backend: &'a dyn GalleryBackend,
    pub artifacts: &'a HashMap<String, String>,
}

impl StepContext<'_> {
    pub fn artifact(&self, key: &str) -> Option<&str> {
        self.artifacts.get(key).map(String::as_str)
    }

    pub fn require_artifact(&self, key: &'static str) -> Result<&str, StepError> {
        self.artifact(key).ok_or(StepError::MissingArtifact(key))
    }
}

/// One discrete remote operation in the fixed publishing pipeline.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Stable identifier, unique within the registry.
    fn id(&self) -> &'static str;

    /// Human-readable label for progress display.
    fn label(&self) -> &'static str;

    /// Perform the step's single remote call. No side effects beyond that
    /// call; invoked at most once per run.
    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError>;
}
