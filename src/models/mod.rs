// src/models/mod.rs
pub mod config;

pub use config::{BackendConfig, Config, OverlayConfig, PipelineConfig};

use serde::Serialize;
use std::collections::HashMap;

/// Terminal result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every step succeeded; the collected artifacts are attached.
    Completed(HashMap<String, String>),
    /// A step failed; nothing after it was attempted.
    Failed { step: String, message: String },
    /// The run was abandoned via its cancellation token. Not an error.
    Cancelled,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// The artifacts a caller may trust after the completion gate has passed:
/// the generated gallery code and the published gallery URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub code: String,
    pub url: String,
}
