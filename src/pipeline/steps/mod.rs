// src/pipeline/steps/mod.rs
pub mod compose;
pub mod generate_code;
pub mod publish;
pub mod workspace;

pub use compose::{DrawOverlayTextStep, RenderCompositeStep};
pub use generate_code::{GenerateCodeStep, CODE_ARTIFACT};
pub use publish::{PublishStep, PUBLISH_STEP_ID, URL_ARTIFACT};
pub use workspace::{
    ClearCaptureWorkspaceStep, ClearWorkspaceStep, StageForPublishStep, StageInputStep,
};

use crate::errors::StepError;
use crate::models::PipelineConfig;
use crate::pipeline::PipelineStep;
use serde_json::Value;
use std::sync::Arc;

/// The fixed, ordered registry for the capture-to-gallery pipeline.
///
/// Order matters: `generate-code` must run before `draw-overlay-text` (its
/// text references the code) and `publish` must run before the final URL
/// artifact can exist. Everything the steps need is taken from the config
/// here, no ambient state.
pub fn build_registry(config: &PipelineConfig) -> Vec<Arc<dyn PipelineStep>> {
    vec![
        Arc::new(ClearWorkspaceStep {
            paths: config.workspace_paths.clone(),
        }),
        Arc::new(StageInputStep),
        Arc::new(GenerateCodeStep),
        Arc::new(RenderCompositeStep),
        Arc::new(DrawOverlayTextStep {
            template: config.overlay.template.clone(),
            input_file: config.overlay.input_file.clone(),
            output_file: config.overlay.output_file.clone(),
        }),
        Arc::new(StageForPublishStep),
        Arc::new(PublishStep),
        Arc::new(ClearCaptureWorkspaceStep {
            paths: config.capture_paths.clone(),
        }),
    ]
}

/// Pull a required, non-empty string field out of an envelope's `data`.
/// Absent data, wrong type, or an empty value is a malformed response and
/// fails the step that received it.
pub(crate) fn require_string_field(
    data: Option<&Value>,
    field: &'static str,
) -> Result<String, StepError> {
    let value = data.and_then(|d| d.get(field)).ok_or_else(|| {
        StepError::malformed(format!("required field `{field}` missing from response data"))
    })?;

    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        Some(_) => Err(StepError::malformed(format!(
            "required field `{field}` is empty"
        ))),
        None => Err(StepError::malformed(format!(
            "required field `{field}` is not a string"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::backend_client::{Envelope, GalleryBackend};
    use crate::errors::StepError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted backend: maps a request path to a canned envelope and
    /// records every request it sees.
    pub struct ScriptedBackend {
        responses: HashMap<String, String>,
        pub requests: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl ScriptedBackend {
        pub fn new(responses: &[(&str, &str)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(path, body)| (path.to_string(), body.to_string()))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GalleryBackend for ScriptedBackend {
        async fn post(&self, path: &str, payload: Option<Value>) -> Result<Envelope, StepError> {
            self.requests
                .lock()
                .unwrap()
                .push((path.to_string(), payload));
            let body = self
                .responses
                .get(path)
                .unwrap_or_else(|| panic!("no scripted response for {path}"));
            Ok(serde_json::from_str(body).unwrap())
        }
    }
}
