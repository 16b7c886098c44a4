// src/lib.rs - capture-to-gallery publishing pipeline orchestrator
pub mod backend_client;
pub mod cli;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod publish_service;

pub use backend_client::{Envelope, EnvelopeStatus, GalleryBackend, HttpBackend};
pub use errors::{PipelineError, StepError};
pub use models::{Publication, RunOutcome};
pub use pipeline::{
    build_registry, CancelController, PipelineEngine, PipelineStep, RunReport, RunSnapshot,
    StepStatus,
};
pub use publish_service::{PublishService, RunHandle};
