//! REMOTE tier: HTTP embedding provider.
//!
//! JSON POST `{model, input}` → `{data: [{embedding}]}`, retry with
//! exponential backoff, and an availability latch that trips after the
//! retries exhaust. An unset API key and an unreachable endpoint look the
//! same from the outside: the tier is unavailable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sift_core::config::EmbeddingConfig;
use sift_core::errors::{EmbeddingError, SiftResult};
use sift_core::tier::Tier;
use sift_core::traits::IEmbeddingProvider;

use crate::registry;

/// Remote HTTP embedding provider (1536 dimensions).
pub struct RemoteProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
    available: AtomicBool,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl RemoteProvider {
    /// Build from config; the API key is read from the configured
    /// environment variable. A missing key leaves the tier unconfigured.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let api_key = std::env::var(&config.remote_api_key_env).ok();
        Self::new(
            config.remote_endpoint.clone(),
            config.remote_model.clone(),
            api_key,
            config.remote_max_retries,
        )
    }

    pub fn new(
        endpoint: String,
        model: String,
        api_key: Option<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            endpoint,
            model,
            api_key,
            dimensions: registry::profile(Tier::Remote).dimensions,
            available: AtomicBool::new(true),
            max_retries,
        }
    }

    /// Send an embedding request with retry and exponential backoff.
    /// Exhausting the retries latches the provider unavailable.
    fn request_embeddings(&self, texts: Vec<String>) -> SiftResult<Vec<Vec<f32>>> {
        if !self.is_available() {
            return Err(EmbeddingError::Unavailable {
                provider: self.name().to_string(),
            }
            .into());
        }

        let body = serde_json::to_string(&EmbedRequest {
            model: self.model.clone(),
            input: texts,
        })?;

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                std::thread::sleep(delay);
                debug!(attempt, "retrying remote embedding request");
            }

            match self.send_request(&body) {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    warn!(attempt, error = %e, "remote embedding request failed");
                    last_err = Some(e);
                }
            }
        }

        self.available.store(false, Ordering::Relaxed);
        Err(last_err.unwrap_or_else(|| {
            EmbeddingError::InferenceFailed {
                reason: "all retries exhausted".to_string(),
            }
            .into()
        }))
    }

    /// One HTTP round trip. The sync `IEmbeddingProvider` trait is bridged
    /// onto reqwest with a current-thread tokio runtime; the request itself
    /// carries the tier's hard timeout.
    fn send_request(&self, body: &str) -> SiftResult<Vec<Vec<f32>>> {
        let api_key = self.api_key.as_ref().ok_or_else(|| EmbeddingError::Unavailable {
            provider: self.name().to_string(),
        })?;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("runtime error: {e}"),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(
                registry::profile(Tier::Remote).hard_timeout_ms(),
            ))
            .build()
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("client error: {e}"),
            })?;

        let endpoint = self.endpoint.clone();
        let api_key = api_key.clone();
        let body_owned = body.to_string();
        let dims = self.dimensions;

        rt.block_on(async {
            let response = client
                .post(&endpoint)
                .header("Authorization", format!("Bearer {api_key}"))
                .header("Content-Type", "application/json")
                .body(body_owned)
                .send()
                .await
                .map_err(|e| EmbeddingError::InferenceFailed {
                    reason: format!("HTTP error: {e}"),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::InferenceFailed {
                    reason: format!("API returned {status}: {body}"),
                }
                .into());
            }

            let resp: EmbedResponse =
                response
                    .json()
                    .await
                    .map_err(|e| EmbeddingError::InferenceFailed {
                        reason: format!("JSON parse error: {e}"),
                    })?;

            let embeddings: Vec<Vec<f32>> = resp
                .data
                .into_iter()
                .map(|d| {
                    let mut v = d.embedding;
                    v.resize(dims, 0.0);
                    v
                })
                .collect();

            Ok(embeddings)
        })
    }

    /// Reset the availability latch (e.g. after a config change).
    pub fn reset_availability(&self) {
        self.available.store(true, Ordering::Relaxed);
    }
}

impl IEmbeddingProvider for RemoteProvider {
    fn embed(&self, text: &str) -> SiftResult<Vec<f32>> {
        let results = self.request_embeddings(vec![text.to_string()])?;
        results.into_iter().next().ok_or_else(|| {
            EmbeddingError::InferenceFailed {
                reason: "empty response".to_string(),
            }
            .into()
        })
    }

    fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
        self.request_embeddings(texts.to_vec())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some() && self.available.load(Ordering::Relaxed)
    }
}
