use serde::{Deserialize, Serialize};

use super::defaults;

/// Retrieval subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default result limit when the caller doesn't set one.
    pub result_limit: usize,
    /// Candidates gathered per source (sparse, dense) before fusion.
    pub candidate_limit: usize,
    /// RRF smoothing constant.
    pub rrf_k: u32,
    /// Weighted-fusion sparse weight.
    pub sparse_weight: f64,
    /// Weighted-fusion dense weight.
    pub dense_weight: f64,
    pub bm25_k1: f64,
    pub bm25_b: f64,
    /// Escalate below this top-1 confidence (weighted/max fusion).
    pub confidence_threshold: f64,
    /// Escalate below this absolute top-1 RRF score.
    pub rrf_confidence_floor: f64,
    /// Hard cap on escalations per query.
    pub max_escalations: u32,
    /// Write-exclusion shard count for index mutation.
    pub index_shards: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            result_limit: defaults::DEFAULT_RESULT_LIMIT,
            candidate_limit: defaults::DEFAULT_CANDIDATE_LIMIT,
            rrf_k: defaults::DEFAULT_RRF_K,
            sparse_weight: defaults::DEFAULT_SPARSE_WEIGHT,
            dense_weight: defaults::DEFAULT_DENSE_WEIGHT,
            bm25_k1: defaults::DEFAULT_BM25_K1,
            bm25_b: defaults::DEFAULT_BM25_B,
            confidence_threshold: defaults::DEFAULT_CONFIDENCE_THRESHOLD,
            rrf_confidence_floor: defaults::DEFAULT_RRF_CONFIDENCE_FLOOR,
            max_escalations: defaults::DEFAULT_MAX_ESCALATIONS,
            index_shards: defaults::DEFAULT_INDEX_SHARDS,
        }
    }
}
