// src/publish_service.rs
use crate::backend_client::GalleryBackend;
use crate::errors::PipelineError;
use crate::models::{Publication, RunOutcome};
use crate::pipeline::cancel::CancelController;
use crate::pipeline::engine::{PipelineEngine, RunReport};
use crate::pipeline::gate;
use crate::pipeline::state::RunSnapshot;
use crate::pipeline::steps::PUBLISH_STEP_ID;
use crate::pipeline::PipelineStep;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// The surface a presentation layer talks to: start a run, cancel it,
/// observe per-step snapshots. At most one run is active; starting a new
/// one supersedes (cancels) whatever was in flight. Dropping the service
/// (the host context closing) cancels the active run the same way.
pub struct PublishService {
    steps: Vec<Arc<dyn PipelineStep>>,
    backend: Arc<dyn GalleryBackend>,
    controller: CancelController,
}

/// One started run: a per-run snapshot subscription plus the awaitable
/// terminal report.
pub struct RunHandle {
    pub run_id: Uuid,
    pub snapshots: watch::Receiver<RunSnapshot>,
    outcome: JoinHandle<RunReport>,
}

impl RunHandle {
    /// Wait for the run's terminal report. The report's outcome has already
    /// passed the completion gate: a run that "completed" without a usable
    /// publication comes back as a publish-step failure.
    pub async fn outcome(self) -> Result<RunReport, PipelineError> {
        self.outcome
            .await
            .map_err(|e| PipelineError::RunTask(e.to_string()))
    }
}

impl PublishService {
    pub fn new(steps: Vec<Arc<dyn PipelineStep>>, backend: Arc<dyn GalleryBackend>) -> Self {
        Self {
            steps,
            backend,
            controller: CancelController::new(),
        }
    }

    /// Start a fresh run, superseding any run still in flight. The new run
    /// begins from a fully reset state: all steps idle, no artifacts.
    pub fn start_run(&self) -> RunHandle {
        let token = self.controller.start_new();
        let engine = PipelineEngine::new(self.steps.clone(), self.backend.clone());
        let run_id = engine.run_id();
        let snapshots = engine.subscribe();

        info!(%run_id, "Starting publish run");
        let outcome = tokio::spawn(async move {
            let mut report = engine.run(token).await;
            if report.outcome.is_completed() {
                if let Err(gate_error) = gate::confirm(&report.snapshot) {
                    // Should be unreachable while the publish step validates
                    // its own response; reaching it means contract drift.
                    error!(%gate_error, "Completed run rejected by completion gate");
                    report.outcome = RunOutcome::Failed {
                        step: PUBLISH_STEP_ID.to_string(),
                        message: gate_error.to_string(),
                    };
                }
            }
            report
        });

        RunHandle {
            run_id,
            snapshots,
            outcome,
        }
    }

    /// Cancel the active run, if any. Safe to call repeatedly.
    pub fn cancel_run(&self) {
        self.controller.cancel_active();
    }

    /// Gate a terminal report into the artifacts a caller may trust.
    pub fn publication(report: &RunReport) -> Option<Publication> {
        gate::confirm(&report.snapshot).ok()
    }
}

impl Drop for PublishService {
    fn drop(&mut self) {
        self.controller.cancel_active();
    }
}
