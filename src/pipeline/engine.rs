// src/pipeline/engine.rs
use crate::backend_client::GalleryBackend;
use crate::models::RunOutcome;
use crate::pipeline::state::{RunSnapshot, RunState};
use crate::pipeline::{PipelineStep, StepContext};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

/// What a finished run hands back: the terminal outcome plus the final
/// per-step snapshot for anyone who wants the details.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub snapshot: RunSnapshot,
}

/// Drives one run of the registry against one backend.
///
/// `run` consumes the engine, so re-entrancy on a single instance is
/// impossible by construction: a new run means a new engine over a fresh
/// [`RunState`]. Progress snapshots are published on a watch channel after
/// every status transition.
pub struct PipelineEngine {
    steps: Vec<Arc<dyn PipelineStep>>,
    backend: Arc<dyn GalleryBackend>,
    state: RunState,
    progress: watch::Sender<RunSnapshot>,
}

impl PipelineEngine {
    pub fn new(steps: Vec<Arc<dyn PipelineStep>>, backend: Arc<dyn GalleryBackend>) -> Self {
        let state = RunState::new(steps.iter().map(|s| (s.id(), s.label())));
        let (progress, _) = watch::channel(state.snapshot());
        Self {
            steps,
            backend,
            state,
            progress,
        }
    }

    /// Seed artifacts collected outside this run (normally none).
    pub fn with_artifacts(mut self, initial: HashMap<String, String>) -> Self {
        self.state.seed_artifacts(initial);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.state.run_id()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.progress.subscribe()
    }

    fn publish_progress(&self) {
        self.progress.send_replace(self.state.snapshot());
    }

    /// Walk the registry in order. Exactly one suspension point per step:
    /// the remote call, raced against the cancellation token. First failure
    /// stops the run; cancellation stops it without marking anything failed.
    pub async fn run(mut self, token: CancellationToken) -> RunReport {
        info!(
            run_id = %self.state.run_id(),
            steps = self.steps.len(),
            "Starting publishing pipeline run"
        );

        let steps = self.steps.clone();
        for (index, step) in steps.iter().enumerate() {
            // Cancelled between steps: nothing is in flight, every remaining
            // step stays Idle.
            if token.is_cancelled() {
                return self.finish_cancelled();
            }

            self.state.mark_running(index);
            self.publish_progress();
            debug!(step = step.id(), "Invoking step");

            let result = {
                let ctx = StepContext {
                    backend: self.backend.as_ref(),
                    artifacts: self.state.artifacts(),
                };
                tokio::select! {
                    _ = token.cancelled() => None,
                    result = step.invoke(&ctx) => Some(result),
                }
            };

            let Some(result) = result else {
                // The in-flight call was dropped with the step future; the
                // step keeps a cancelled marker, not an error.
                return self.finish_cancelled();
            };

            match result {
                Ok(artifacts) => {
                    for (key, value) in artifacts {
                        self.state.record_artifact(key, value);
                    }
                    self.state.mark_success(index);
                    self.publish_progress();
                    info!(step = step.id(), "Step succeeded");
                }
                Err(step_error) => {
                    let message = step_error.to_string();
                    error!(step = step.id(), %message, "Step failed, aborting run");
                    self.state.mark_error(index, message.clone());
                    self.publish_progress();
                    return RunReport {
                        outcome: RunOutcome::Failed {
                            step: step.id().to_string(),
                            message,
                        },
                        snapshot: self.state.snapshot(),
                    };
                }
            }
        }

        info!(run_id = %self.state.run_id(), "Run completed");
        RunReport {
            outcome: RunOutcome::Completed(self.state.artifacts().clone()),
            snapshot: self.state.snapshot(),
        }
    }

    fn finish_cancelled(mut self) -> RunReport {
        info!(run_id = %self.state.run_id(), "Run cancelled");
        self.state.cancel();
        self.publish_progress();
        RunReport {
            outcome: RunOutcome::Cancelled,
            snapshot: self.state.snapshot(),
        }
    }
}
