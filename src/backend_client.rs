// src/backend_client.rs
use crate::errors::{PipelineError, StepError};
use crate::models::config::BackendConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Response envelope every pipeline step receives from the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

impl Envelope {
    /// Unwrap the envelope: a success yields its `data` payload, an error
    /// becomes a `StepError::Remote` carrying the backend's message (or a
    /// generic fallback when the backend sent none).
    pub fn into_data(self) -> Result<Option<Value>, StepError> {
        match self.status {
            EnvelopeStatus::Success => Ok(self.data),
            EnvelopeStatus::Error => {
                let message = if self.message.trim().is_empty() {
                    "backend reported an unspecified error".to_string()
                } else {
                    self.message
                };
                Err(StepError::Remote(message))
            }
        }
    }
}

/// The remote boundary every pipeline step calls through. The production
/// implementation speaks HTTP/JSON; tests script this trait directly.
#[async_trait]
pub trait GalleryBackend: Send + Sync {
    /// POST one step request. `payload: None` sends no body at all, which is
    /// distinct from an empty JSON object on the wire.
    async fn post(&self, path: &str, payload: Option<Value>) -> Result<Envelope, StepError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(PipelineError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check if the backend is reachable before starting a run
    pub async fn health_check(&self) -> bool {
        let url = self.url_for("/health");
        info!("Checking backend health at {}", url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Backend is available at {}", self.base_url);
                true
            }
            Ok(response) => {
                warn!(
                    "Backend at {} answered health check with status {}",
                    self.base_url,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("Backend is not available at {}: {}", self.base_url, e);
                false
            }
        }
    }
}

#[async_trait]
impl GalleryBackend for HttpBackend {
    async fn post(&self, path: &str, payload: Option<Value>) -> Result<Envelope, StepError> {
        let url = self.url_for(path);
        debug!("Posting step request to {}", url);

        let request = self.client.post(&url);
        let request = match payload {
            Some(body) => request.json(&body),
            None => request,
        };

        let response = request.send().await?.error_for_status()?;

        let envelope = response
            .json::<Envelope>()
            .await
            .map_err(|e| StepError::Malformed(format!("could not decode response envelope: {e}")))?;

        debug!("Backend answered {:?} for {}", envelope.status, url);
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success_yields_data() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"status":"success","message":"ok","data":{"code":"A001"}}"#,
        )
        .unwrap();
        let data = envelope.into_data().unwrap().unwrap();
        assert_eq!(data["code"], "A001");
    }

    #[test]
    fn envelope_error_carries_backend_message() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"status":"error","message":"disk full"}"#).unwrap();
        match envelope.into_data() {
            Err(StepError::Remote(message)) => assert_eq!(message, "disk full"),
            other => panic!("expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_error_without_message_gets_fallback() {
        let envelope: Envelope = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        match envelope.into_data() {
            Err(StepError::Remote(message)) => {
                assert_eq!(message, "backend reported an unspecified error")
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_success_without_data_is_fine() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"status":"success","message":""}"#).unwrap();
        assert!(envelope.into_data().unwrap().is_none());
    }

    #[test]
    fn url_joining_handles_slashes() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:8089/".to_string(),
            request_timeout_secs: 1,
            connect_timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(
            backend.url_for("/workspace/clear"),
            "http://localhost:8089/workspace/clear"
        );
        assert_eq!(backend.url_for("publish"), "http://localhost:8089/publish");
    }
}
