// src/pipeline/state.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Lifecycle of one step within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Idle,
    Running,
    Success,
    Error,
    /// The run was abandoned while this step's remote call was in flight.
    /// Only ever set by cancellation; never by the step itself.
    Cancelled,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepStatus::Idle => "idle",
            StepStatus::Running => "running",
            StepStatus::Success => "ok",
            StepStatus::Error => "failed",
            StepStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
struct StepSlot {
    id: String,
    label: String,
    status: StepStatus,
}

/// Mutable record of one pipeline execution. Owned exclusively by the engine
/// driving it; observers only ever see [`RunSnapshot`] clones.
///
/// The mutation methods enforce the run invariants: statuses only move
/// forward, artifacts are append-only, and nothing changes once the run has
/// been cancelled (other than the single in-flight `Cancelled` marker that
/// cancellation itself applies).
#[derive(Debug)]
pub struct RunState {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    steps: Vec<StepSlot>,
    error_message: Option<String>,
    cancelled: bool,
    artifacts: HashMap<String, String>,
}

impl RunState {
    pub fn new<'a>(steps: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            steps: steps
                .into_iter()
                .map(|(id, label)| StepSlot {
                    id: id.to_string(),
                    label: label.to_string(),
                    status: StepStatus::Idle,
                })
                .collect(),
            error_message: None,
            cancelled: false,
            artifacts: HashMap::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn artifacts(&self) -> &HashMap<String, String> {
        &self.artifacts
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Seed artifacts collected before this run (normally empty).
    pub fn seed_artifacts(&mut self, initial: HashMap<String, String>) {
        for (key, value) in initial {
            self.record_artifact(key, value);
        }
    }

    pub fn mark_running(&mut self, index: usize) {
        if self.cancelled {
            return;
        }
        debug_assert!(
            self.steps.iter().all(|s| s.status != StepStatus::Running),
            "a step is already running"
        );
        self.steps[index].status = StepStatus::Running;
    }

    pub fn mark_success(&mut self, index: usize) {
        if self.cancelled {
            return;
        }
        self.steps[index].status = StepStatus::Success;
    }

    pub fn mark_error(&mut self, index: usize, message: impl Into<String>) {
        if self.cancelled {
            return;
        }
        self.steps[index].status = StepStatus::Error;
        self.error_message = Some(message.into());
    }

    /// First write to a key wins; a later step writing the same key is a
    /// registry bug and is ignored, keeping the earlier value.
    pub fn record_artifact(&mut self, key: String, value: String) {
        if self.cancelled {
            return;
        }
        match self.artifacts.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(slot) => {
                warn!(
                    "Artifact `{}` already recorded for this run, keeping the first value",
                    slot.key()
                );
            }
        }
    }

    /// Abandon the run. The step whose call was in flight (if any) gets the
    /// `Cancelled` marker; every other status is frozen as-is. Idempotent.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        for slot in &mut self.steps {
            if slot.status == StepStatus::Running {
                slot.status = StepStatus::Cancelled;
            }
        }
    }

    pub fn all_success(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Success)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.run_id,
            started_at: self.started_at,
            steps: self
                .steps
                .iter()
                .map(|s| StepSnapshot {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    status: s.status,
                })
                .collect(),
            error_message: self.error_message.clone(),
            cancelled: self.cancelled,
            artifacts: self.artifacts.clone(),
        }
    }
}

/// Immutable view of a [`RunState`], published to observers after every
/// transition.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepSnapshot>,
    pub error_message: Option<String>,
    pub cancelled: bool,
    pub artifacts: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSnapshot {
    pub id: String,
    pub label: String,
    pub status: StepStatus,
}

impl RunSnapshot {
    pub fn status_of(&self, step_id: &str) -> Option<StepStatus> {
        self.steps.iter().find(|s| s.id == step_id).map(|s| s.status)
    }

    pub fn artifact(&self, key: &str) -> Option<&str> {
        self.artifacts.get(key).map(String::as_str)
    }
}
