// src/pipeline/steps/generate_code.rs
use crate::errors::StepError;
use crate::pipeline::steps::require_string_field;
use crate::pipeline::{PipelineStep, StepArtifacts, StepContext};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// Artifact key under which the generated gallery code is recorded.
pub const CODE_ARTIFACT: &str = "code";

/// Ask the backend for a fresh, unique gallery code. Later steps reference
/// it (the overlay text) and the final outcome carries it.
pub struct GenerateCodeStep;

#[async_trait]
impl PipelineStep for GenerateCodeStep {
    fn id(&self) -> &'static str {
        "generate-code"
    }

    fn label(&self) -> &'static str {
        "Generate gallery code"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        let envelope = ctx.backend.post("/codes/generate", Some(json!({}))).await?;
        let data = envelope.into_data()?;
        let code = require_string_field(data.as_ref(), "code")?;

        info!("Generated gallery code {}", code);
        Ok(vec![(CODE_ARTIFACT.to_string(), code)])
    }
}
