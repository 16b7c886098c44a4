// src/main.rs
use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use snapflow::backend_client::HttpBackend;
use snapflow::cli::{display_custom_help, handle_cli, Cli};
use snapflow::models::config::load_config;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() <= 1 {
        display_custom_help();
        std::process::exit(0);
    }

    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("INFO")))
        .init();

    dotenv().ok();

    let cli = Cli::parse();

    let mut config = load_config().await?;

    // CLI override wins over the configured backend address
    if let Some(api_url) = cli.api.clone() {
        info!("Using backend URL from CLI: {}", api_url);
        config.backend.base_url = api_url;
    }

    let backend = Arc::new(HttpBackend::new(&config.backend)?);

    handle_cli(cli, backend, config.pipeline).await
}
