// src/pipeline/steps/compose.rs
use crate::errors::StepError;
use crate::pipeline::steps::CODE_ARTIFACT;
use crate::pipeline::{PipelineStep, StepArtifacts, StepContext};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Render the photo composite from the staged input.
pub struct RenderCompositeStep;

#[async_trait]
impl PipelineStep for RenderCompositeStep {
    fn id(&self) -> &'static str {
        "render-composite"
    }

    fn label(&self) -> &'static str {
        "Render composite"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        let envelope = ctx.backend.post("/render/composite", None).await?;
        envelope.into_data()?;
        Ok(Vec::new())
    }
}

/// Draw the overlay text (the gallery code, by default) onto the rendered
/// composite. The `{code}` placeholder in the template is filled from the
/// artifacts collected so far, which is why this step must run after
/// `generate-code`.
pub struct DrawOverlayTextStep {
    pub template: String,
    pub input_file: String,
    pub output_file: String,
}

impl DrawOverlayTextStep {
    fn render_text(&self, ctx: &StepContext<'_>) -> Result<String, StepError> {
        if !self.template.contains("{code}") {
            return Ok(self.template.clone());
        }
        let code = ctx.require_artifact(CODE_ARTIFACT)?;
        Ok(self.template.replace("{code}", code))
    }
}

#[async_trait]
impl PipelineStep for DrawOverlayTextStep {
    fn id(&self) -> &'static str {
        "draw-overlay-text"
    }

    fn label(&self) -> &'static str {
        "Draw overlay text"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        let text = self.render_text(ctx)?;
        debug!("Drawing overlay text: {}", text);

        let envelope = ctx
            .backend
            .post(
                "/render/overlay",
                Some(json!({
                    "text": text,
                    "inputFile": self.input_file,
                    "outputFile": self.output_file,
                })),
            )
            .await?;
        envelope.into_data()?;
        Ok(Vec::new())
    }
}
