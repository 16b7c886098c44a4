// src/pipeline/steps/publish.rs
use crate::errors::StepError;
use crate::pipeline::steps::require_string_field;
use crate::pipeline::{PipelineStep, StepArtifacts, StepContext};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

pub const PUBLISH_STEP_ID: &str = "publish";

/// Artifact key under which the published gallery URL is recorded.
pub const URL_ARTIFACT: &str = "url";

/// Publish the staged files to the gallery. The response must carry the
/// final gallery URL; an HTTP-successful envelope without it is a failure
/// of this step, never an empty completed run.
pub struct PublishStep;

#[async_trait]
impl PipelineStep for PublishStep {
    fn id(&self) -> &'static str {
        PUBLISH_STEP_ID
    }

    fn label(&self) -> &'static str {
        "Publish to gallery"
    }

    async fn invoke(&self, ctx: &StepContext<'_>) -> Result<StepArtifacts, StepError> {
        let envelope = ctx.backend.post("/publish", Some(json!({}))).await?;
        let data = envelope.into_data()?;
        let url = require_string_field(data.as_ref(), "url")?;

        info!("Published gallery at {}", url);
        Ok(vec![(URL_ARTIFACT.to_string(), url)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::steps::test_support::ScriptedBackend;
    use std::collections::HashMap;

    async fn run_against(body: &str) -> Result<StepArtifacts, StepError> {
        let backend = ScriptedBackend::new(&[("/publish", body)]);
        let artifacts = HashMap::new();
        let ctx = StepContext {
            backend: &backend,
            artifacts: &artifacts,
        };
        PublishStep.invoke(&ctx).await
    }

    #[tokio::test]
    async fn returns_the_url_artifact() {
        let artifacts = run_against(
            r#"{"status":"success","message":"","data":{"url":"https://host/x.jpg"}}"#,
        )
        .await
        .unwrap();
        assert_eq!(
            artifacts,
            vec![("url".to_string(), "https://host/x.jpg".to_string())]
        );
    }

    #[tokio::test]
    async fn success_envelope_without_url_is_a_step_failure() {
        let result = run_against(r#"{"status":"success","message":"done","data":{}}"#).await;
        assert!(matches!(result, Err(StepError::Malformed(_))));
    }

    #[tokio::test]
    async fn empty_url_is_a_step_failure() {
        let result =
            run_against(r#"{"status":"success","message":"","data":{"url":"  "}}"#).await;
        assert!(matches!(result, Err(StepError::Malformed(_))));
    }
}
