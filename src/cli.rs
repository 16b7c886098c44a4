// src/cli.rs
use clap::Parser;
use std::{error::Error, sync::Arc};
use tokio::signal;
use tracing::{error, info};

use crate::backend_client::HttpBackend;
use crate::models::{PipelineConfig, RunOutcome};
use crate::pipeline::state::StepStatus;
use crate::pipeline::steps::build_registry;
use crate::publish_service::PublishService;

pub fn display_custom_help() {
    println!(
        "
╭─────────────────────────────────────────────────╮
│                  Snapflow                       │
│      Capture-to-Gallery Publishing Pipeline     │
╰─────────────────────────────────────────────────╯

ARGUMENTS:
  --api URL          Backend base URL
                     Default: From config.yaml

  --caption TEXT     Overlay text template for this run
                     ({{code}} is replaced with the generated code)
                     Default: From config.yaml

USAGE EXAMPLES:
  1. Run the publishing pipeline:
     snapflow --publish

  2. Run with a custom caption:
     snapflow --publish --caption \"Anna & Ben {{code}}\"

  3. Run against another backend:
     snapflow --publish --api http://render-host:8089

  4. List the pipeline steps in order:
     snapflow --list-steps

PIPELINE:
  clear workspace → stage input → generate code → render composite
  → draw overlay → stage for publish → publish → clear capture workspace

For more information, use the standard help:
  snapflow --help
"
    );
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run the publishing pipeline
    #[arg(long)]
    pub publish: bool,

    /// Backend base URL (default from config.yaml)
    #[arg(long, value_name = "URL")]
    pub api: Option<String>,

    /// Overlay text template for this run ({code} is replaced with the
    /// generated gallery code)
    #[arg(long, value_name = "TEXT")]
    pub caption: Option<String>,

    /// List the pipeline steps in registry order
    #[arg(long, help = "List the pipeline steps in registry order")]
    pub list_steps: bool,
}

pub async fn handle_cli(
    cli: Cli,
    backend: Arc<HttpBackend>,
    mut pipeline_config: PipelineConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(caption) = cli.caption.clone() {
        pipeline_config.overlay.template = caption;
    }

    if cli.list_steps {
        let registry = build_registry(&pipeline_config);
        println!("\nPipeline steps ({} total):", registry.len());
        for (index, step) in registry.iter().enumerate() {
            println!("  {}. {} ({})", index + 1, step.id(), step.label());
        }
        return Ok(());
    }

    if cli.publish {
        // fail early with a readable message instead of on step one
        if !backend.health_check().await {
            error!("Backend is not reachable, aborting");
            return Err("Backend is not reachable. Check --api or config.yaml".into());
        }

        return run_pipeline(backend, &pipeline_config).await;
    }

    Ok(())
}

async fn run_pipeline(
    backend: Arc<HttpBackend>,
    pipeline_config: &PipelineConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let service = Arc::new(PublishService::new(
        build_registry(pipeline_config),
        backend,
    ));

    let handle = service.start_run();
    info!("Run {} started", handle.run_id);

    // Ctrl-C cancels the active run; the run then settles as Cancelled.
    let signal_service = service.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, cancelling active run");
            signal_service.cancel_run();
        }
    });

    let mut snapshots = handle.snapshots.clone();
    let printer = tokio::spawn(async move {
        let mut last_seen: Vec<StepStatus> = Vec::new();
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            last_seen.resize(snapshot.steps.len(), StepStatus::Idle);
            for (index, step) in snapshot.steps.iter().enumerate() {
                if step.status != last_seen[index] {
                    println!(
                        "  [{}/{}] {}: {}",
                        index + 1,
                        snapshot.steps.len(),
                        step.label,
                        step.status
                    );
                    last_seen[index] = step.status;
                }
            }
        }
    });

    let report = handle.outcome().await?;
    // the engine is gone, so the watch channel is closed and the printer ends
    let _ = printer.await;

    match report.outcome {
        RunOutcome::Completed(_) => {
            let publication = PublishService::publication(&report)
                .ok_or("Run completed but produced no publication")?;
            println!("\nPublished!");
            println!("  Code: {}", publication.code);
            println!("  Gallery URL: {}", publication.url);
            Ok(())
        }
        RunOutcome::Failed { step, message } => {
            println!("\nRun failed at step `{step}`.");
            Err(format!("Step `{step}` failed: {message}").into())
        }
        RunOutcome::Cancelled => {
            println!("\nRun cancelled.");
            Ok(())
        }
    }
}
