// src/models/config.rs
use serde::Deserialize;
use std::env;
use std::error::Error;
use tracing::debug;

fn get_config_path() -> String {
    env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base address of the rendering/publishing backend.
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverlayConfig {
    /// Text drawn onto the composite. `{code}` is replaced with the
    /// generated gallery code.
    pub template: String,
    pub input_file: String,
    pub output_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Server-side paths wiped before a run stages new input.
    pub workspace_paths: Vec<String>,
    /// Capture-side paths wiped after a successful publish.
    pub capture_paths: Vec<String>,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub pipeline: PipelineConfig,
}

pub async fn load_config() -> Result<Config, Box<dyn Error + Send + Sync>> {
    let config_path = get_config_path();
    let config_str = tokio::fs::read_to_string(&config_path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    debug!("Loaded configuration from: {}", config_path);

    Ok(config)
}

// Load backend configuration from config file
pub async fn load_backend_config() -> Result<BackendConfig, Box<dyn Error + Send + Sync>> {
    let config = load_config().await?;

    debug!("Backend config: {:#?}", config.backend);

    Ok(config.backend)
}

// Load pipeline configuration from config file
pub async fn load_pipeline_config() -> Result<PipelineConfig, Box<dyn Error + Send + Sync>> {
    let config = load_config().await?;

    debug!("Pipeline config: {:#?}", config.pipeline);

    Ok(config.pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
backend:
  base_url: http://localhost:8089
  request_timeout_secs: 10
pipeline:
  workspace_paths:
    - /var/snapflow/work
  capture_paths:
    - /var/snapflow/capture
  overlay:
    template: "{code}"
    input_file: composite.jpg
    output_file: final.jpg
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8089");
        assert_eq!(config.backend.request_timeout_secs, 10);
        // not set in the file, falls back to the default
        assert_eq!(config.backend.connect_timeout_secs, 5);
        assert_eq!(config.pipeline.workspace_paths, vec!["/var/snapflow/work"]);
        assert_eq!(config.pipeline.overlay.template, "{code}");
    }
}
