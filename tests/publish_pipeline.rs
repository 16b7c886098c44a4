//! End-to-end runs of the full publishing registry against a scripted
//! backend (no network).

use async_trait::async_trait;
use serde_json::Value;
use snapflow::backend_client::{Envelope, GalleryBackend};
use snapflow::errors::StepError;
use snapflow::models::config::{OverlayConfig, PipelineConfig};
use snapflow::models::RunOutcome;
use snapflow::pipeline::{build_registry, PipelineEngine, StepStatus};
use snapflow::publish_service::PublishService;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const OK: &str = r#"{"status":"success","message":""}"#;

fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        workspace_paths: vec!["/var/snapflow/workspace".into()],
        capture_paths: vec!["/var/snapflow/capture".into()],
        overlay: OverlayConfig {
            template: "{code}".into(),
            input_file: "composite.jpg".into(),
            output_file: "final.jpg".into(),
        },
    }
}

/// Scripted backend: canned envelope per path, every request recorded.
/// A path listed in `hang_and_cancel` cancels the given token and then
/// blocks until the request future is dropped.
struct ScriptedBackend {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<(String, Option<Value>)>>,
    hang_and_cancel: Option<(String, CancellationToken)>,
}

impl ScriptedBackend {
    fn new(responses: &[(&str, &str)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(path, body)| (path.to_string(), body.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
            hang_and_cancel: None,
        }
    }

    fn hanging_on(mut self, path: &str, token: CancellationToken) -> Self {
        self.hang_and_cancel = Some((path.to_string(), token));
        self
    }

    fn recorded_paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl GalleryBackend for ScriptedBackend {
    async fn post(&self, path: &str, payload: Option<Value>) -> Result<Envelope, StepError> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), payload));

        if let Some((hang_path, token)) = &self.hang_and_cancel {
            if hang_path == path {
                token.cancel();
                std::future::pending::<()>().await;
            }
        }

        let body = self
            .responses
            .get(path)
            .unwrap_or_else(|| panic!("no scripted response for {path}"));
        Ok(serde_json::from_str(body).unwrap())
    }
}

fn happy_backend() -> ScriptedBackend {
    ScriptedBackend::new(&[
        ("/workspace/clear", OK),
        ("/capture/stage", OK),
        (
            "/codes/generate",
            r#"{"status":"success","message":"","data":{"code":"A001"}}"#,
        ),
        ("/render/composite", OK),
        ("/render/overlay", OK),
        ("/publish/stage", OK),
        (
            "/publish",
            r#"{"status":"success","message":"","data":{"url":"https://host/x.jpg"}}"#,
        ),
        ("/capture/clear", OK),
    ])
}

#[tokio::test]
async fn full_pipeline_publishes_and_reports_code_and_url() {
    let backend = Arc::new(happy_backend());
    let service = PublishService::new(build_registry(&pipeline_config()), backend.clone());

    let report = service.start_run().outcome().await.unwrap();

    match &report.outcome {
        RunOutcome::Completed(artifacts) => {
            assert_eq!(artifacts["code"], "A001");
            assert_eq!(artifacts["url"], "https://host/x.jpg");
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let publication = PublishService::publication(&report).unwrap();
    assert_eq!(publication.code, "A001");
    assert_eq!(publication.url, "https://host/x.jpg");

    // every step ran exactly once, in registry order
    assert_eq!(
        backend.recorded_paths(),
        vec![
            "/workspace/clear",
            "/capture/stage",
            "/codes/generate",
            "/render/composite",
            "/render/overlay",
            "/publish/stage",
            "/publish",
            "/capture/clear",
        ]
    );

    // the overlay drew the generated code
    let requests = backend.requests.lock().unwrap();
    let overlay_payload = requests
        .iter()
        .find(|(path, _)| path == "/render/overlay")
        .and_then(|(_, payload)| payload.clone())
        .unwrap();
    assert_eq!(overlay_payload["text"], "A001");
}

#[tokio::test]
async fn code_generation_failure_stops_the_run_at_that_step() {
    let backend = Arc::new(ScriptedBackend::new(&[
        ("/workspace/clear", OK),
        ("/capture/stage", OK),
        (
            "/codes/generate",
            r#"{"status":"error","message":"disk full"}"#,
        ),
    ]));
    let service = PublishService::new(build_registry(&pipeline_config()), backend.clone());

    let report = service.start_run().outcome().await.unwrap();

    match &report.outcome {
        RunOutcome::Failed { step, message } => {
            assert_eq!(step, "generate-code");
            assert_eq!(message, "disk full");
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    let snapshot = &report.snapshot;
    assert_eq!(
        snapshot.status_of("clear-workspace"),
        Some(StepStatus::Success)
    );
    assert_eq!(
        snapshot.status_of("generate-code"),
        Some(StepStatus::Error)
    );
    // nothing after the failure was attempted
    assert_eq!(snapshot.status_of("publish"), Some(StepStatus::Idle));
    assert_eq!(
        snapshot.status_of("clear-capture-workspace"),
        Some(StepStatus::Idle)
    );
    assert!(!backend
        .recorded_paths()
        .iter()
        .any(|path| path == "/publish"));
    assert!(PublishService::publication(&report).is_none());
}

#[tokio::test]
async fn publish_without_url_fails_the_publish_step() {
    let backend = Arc::new(ScriptedBackend::new(&[
        ("/workspace/clear", OK),
        ("/capture/stage", OK),
        (
            "/codes/generate",
            r#"{"status":"success","message":"","data":{"code":"A001"}}"#,
        ),
        ("/render/composite", OK),
        ("/render/overlay", OK),
        ("/publish/stage", OK),
        ("/publish", r#"{"status":"success","message":"","data":{}}"#),
    ]));
    let service = PublishService::new(build_registry(&pipeline_config()), backend);

    let report = service.start_run().outcome().await.unwrap();

    match &report.outcome {
        RunOutcome::Failed { step, .. } => assert_eq!(step, "publish"),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(
        report.snapshot.status_of("publish"),
        Some(StepStatus::Error)
    );
}

#[tokio::test]
async fn cancellation_during_the_publish_call_keeps_earlier_successes() {
    let token = CancellationToken::new();
    let backend = Arc::new(happy_backend().hanging_on("/publish", token.clone()));

    let engine = PipelineEngine::new(build_registry(&pipeline_config()), backend);
    let report = engine.run(token).await;

    assert_eq!(report.outcome, RunOutcome::Cancelled);

    let snapshot = &report.snapshot;
    assert_eq!(
        snapshot.status_of("clear-workspace"),
        Some(StepStatus::Success)
    );
    assert_eq!(
        snapshot.status_of("generate-code"),
        Some(StepStatus::Success)
    );
    // the in-flight publish call gets the cancelled marker
    assert_eq!(
        snapshot.status_of("publish"),
        Some(StepStatus::Cancelled)
    );
    assert_eq!(
        snapshot.status_of("clear-capture-workspace"),
        Some(StepStatus::Idle)
    );
    assert!(snapshot.error_message.is_none());
    // artifacts collected before cancellation are retained but not gated
    assert_eq!(snapshot.artifact("code"), Some("A001"));
    assert!(snapshot.artifact("url").is_none());
}
