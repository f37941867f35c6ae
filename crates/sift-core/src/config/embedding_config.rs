use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Remote embedding API endpoint.
    pub remote_endpoint: String,
    /// Model name sent to the remote API.
    pub remote_model: String,
    /// Environment variable holding the remote API key. An unset variable
    /// means the remote tier is unconfigured, which counts as unreachable.
    pub remote_api_key_env: String,
    /// Retry attempts for remote requests before the tier is latched down.
    pub remote_max_retries: u32,
    /// Batch size for embedding operations.
    pub batch_size: usize,
    /// L1 in-memory cache max entries.
    pub l1_cache_size: u64,
    /// Enable the L2 SQLite cache.
    pub l2_cache_enabled: bool,
    /// Estimated-token threshold above which the accurate tier is preferred.
    pub long_text_token_threshold: usize,
    /// Latency budgets below this select the fast tier.
    pub fast_latency_cutoff_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            remote_endpoint: defaults::DEFAULT_REMOTE_ENDPOINT.to_string(),
            remote_model: defaults::DEFAULT_REMOTE_MODEL.to_string(),
            remote_api_key_env: defaults::DEFAULT_REMOTE_API_KEY_ENV.to_string(),
            remote_max_retries: defaults::DEFAULT_REMOTE_MAX_RETRIES,
            batch_size: defaults::DEFAULT_EMBEDDING_BATCH_SIZE,
            l1_cache_size: defaults::DEFAULT_L1_CACHE_SIZE,
            l2_cache_enabled: defaults::DEFAULT_L2_CACHE_ENABLED,
            long_text_token_threshold: defaults::DEFAULT_LONG_TEXT_TOKEN_THRESHOLD,
            fast_latency_cutoff_ms: defaults::DEFAULT_FAST_LATENCY_CUTOFF_MS,
        }
    }
}
