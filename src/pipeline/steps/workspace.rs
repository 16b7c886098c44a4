// src/pipeline/steps/workspace.rs
use crate::errors::StepError;
use crate::pipeline::{PipelineStep, StepArtifacts, StepContext};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Wipe the server-side working directories before staging fresh input.
pub struct ClearWorkspaceStep {
    pub paths: Vec<String>,
}

#[async_trait]
impl PipelineStep for ClearWorkspaceStep {
    fn id(&self) -> &'static str {
        "clear-workspace"
    }

    fn label(&self) -> &'static str {
        "Clear workspace"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        debug!("Clearing {} workspace path(s)", self.paths.len());
        let envelope = ctx
            .backend
            .post("/workspace/clear", Some(json!({ "paths": self.paths })))
            .await?;
        envelope.into_data()?;
        Ok(Vec::new())
    }
}

/// Move the captured input into the backend's working area.
pub struct StageInputStep;

#[async_trait]
impl PipelineStep for StageInputStep {
    fn id(&self) -> &'static str {
        "stage-input"
    }

    fn label(&self) -> &'static str {
        "Stage captured input"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        // no request data for this step, so no body on the wire
        let envelope = ctx.backend.post("/capture/stage", None).await?;
        envelope.into_data()?;
        Ok(Vec::new())
    }
}

/// Move the finished files into the publish staging area.
pub struct StageForPublishStep;

#[async_trait]
impl PipelineStep for StageForPublishStep {
    fn id(&self) -> &'static str {
        "stage-for-publish"
    }

    fn label(&self) -> &'static str {
        "Stage for publish"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        let envelope = ctx.backend.post("/publish/stage", Some(json!({}))).await?;
        envelope.into_data()?;
        Ok(Vec::new())
    }
}

/// Wipe the capture workspace once the photo has been published.
pub struct ClearCaptureWorkspaceStep {
    pub paths: Vec<String>,
}

#[async_trait]
impl PipelineStep for ClearCaptureWorkspaceStep {
    fn id(&self) -> &'static str {
        "clear-capture-workspace"
    }

    fn label(&self) -> &'static str {
        "Clear capture workspace"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        debug!("Clearing {} capture path(s)", self.paths.len());
        let envelope = ctx
            .backend
            .post("/capture/clear", Some(json!({ "paths": self.paths })))
            .await?;
        envelope.into_data()?;
        Ok(Vec::new())
    }
}
