use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use memorybridge_core::config::EmbeddingConfig;
use memorybridge_core::error::MemoryBridgeError;

use super::{reject_empty, EmbeddingService};
use crate::similarity::l2_normalize;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding service backed by a remote accelerator endpoint.
///
/// Sends `POST {endpoint}/embeddings` with `{"input", "model"}` and a bearer
/// token, and reads `data[0].embedding` from the reply. Every request is
/// bounded by the configured timeout. Timeouts, transport failures,
/// non-success statuses and malformed bodies all surface as
/// `MemoryBridgeError::Embedding`.
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    timeout: Duration,
}

impl RemoteEmbeddingService {
    /// Build a client from the `[embedding]` config section.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, MemoryBridgeError> {
        Self::new(
            &config.endpoint,
            &config.api_key,
            &config.model,
            config.dimensions,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn new(
        endpoint: &str,
        api_key: &str,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self, MemoryBridgeError> {
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(MemoryBridgeError::Config(
                "remote embedding endpoint is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MemoryBridgeError::Embedding(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimensions,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call_api(&self, text: &str) -> Result<Vec<f32>, MemoryBridgeError> {
        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MemoryBridgeError::Embedding(format!(
                        "remote endpoint timed out after {}s",
                        self.timeout.as_secs_f64()
                    ))
                } else {
                    MemoryBridgeError::Embedding(format!("remote request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(MemoryBridgeError::Embedding(format!(
                "remote endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            MemoryBridgeError::Embedding(format!("malformed embedding response: {}", e))
        })?;

        debug!(
            model = parsed.model.as_deref().unwrap_or(self.model.as_str()),
            "Remote embedding received"
        );

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                MemoryBridgeError::Embedding("remote endpoint returned no embedding".to_string())
            })
    }
}

impl EmbeddingService for RemoteEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryBridgeError> {
        reject_empty(text)?;
        let mut vector = self.call_api(text).await?;
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}
