use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::tier::Tier;

/// How sparse and dense ranked lists are merged into one ordering.
///
/// A tagged variant routed through a single `fuse` function, not a trait
/// hierarchy: the set of methods is closed and each carries at most a pair
/// of weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// Reciprocal Rank Fusion: `Σ 1/(k + rank)`, no score normalization.
    Rrf,
    /// Weighted sum of max-normalized scores.
    Weighted { sparse: f64, dense: f64 },
    /// Max of the max-normalized scores.
    Max,
}

impl FusionMethod {
    /// The weighted variant with the stock 0.4/0.6 split.
    pub fn weighted_default() -> Self {
        FusionMethod::Weighted {
            sparse: defaults::DEFAULT_SPARSE_WEIGHT,
            dense: defaults::DEFAULT_DENSE_WEIGHT,
        }
    }

    /// Short label for logs and responses.
    pub fn label(&self) -> &'static str {
        match self {
            FusionMethod::Rrf => "rrf",
            FusionMethod::Weighted { .. } => "weighted",
            FusionMethod::Max => "max",
        }
    }
}

impl Default for FusionMethod {
    fn default() -> Self {
        FusionMethod::Rrf
    }
}

impl std::fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-query knobs supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Maximum results to return.
    pub limit: usize,
    pub fusion_method: FusionMethod,
    /// When set and the remote tier is reachable, start there.
    pub accuracy_critical: bool,
    /// Caller's latency budget; under 50ms this pins the fast tier.
    pub latency_budget_ms: Option<u64>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: defaults::DEFAULT_RESULT_LIMIT,
            fusion_method: FusionMethod::default(),
            accuracy_critical: false,
            latency_budget_ms: None,
        }
    }
}

/// One ranked hit. Transient, never persisted. Component scores are
/// comparable only within the query execution that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: String,
    /// BM25 score, absent when the document only matched densely.
    pub sparse_score: Option<f64>,
    /// Cosine similarity, absent when the document only matched sparsely.
    pub dense_score: Option<f64>,
    pub fused_score: f64,
    /// 1-based position in the final ordering.
    pub rank: usize,
    pub tier_used: Tier,
    pub fusion_method: FusionMethod,
}

/// The full answer to one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Ordered by `fused_score` descending, ties by `document_id` ascending.
    pub results: Vec<SearchResult>,
    /// Tier of the final (non-escalated-away-from) round.
    pub tier_used: Tier,
    pub fusion_method: FusionMethod,
    pub escalation_count: u32,
    pub total_latency_ms: u64,
}

impl QueryResponse {
    /// An empty response, e.g. for a query that tokenizes to nothing.
    pub fn empty(tier: Tier, fusion_method: FusionMethod) -> Self {
        Self {
            results: Vec::new(),
            tier_used: tier,
            fusion_method,
            escalation_count: 0,
            total_latency_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_method_wire_forms() {
        assert_eq!(serde_json::to_string(&FusionMethod::Rrf).unwrap(), "\"rrf\"");
        assert_eq!(serde_json::to_string(&FusionMethod::Max).unwrap(), "\"max\"");
        let weighted = serde_json::to_string(&FusionMethod::weighted_default()).unwrap();
        assert_eq!(weighted, "{\"weighted\":{\"sparse\":0.4,\"dense\":0.6}}");
    }

    #[test]
    fn options_default_to_rrf() {
        let opts = QueryOptions::default();
        assert_eq!(opts.fusion_method, FusionMethod::Rrf);
        assert!(!opts.accuracy_critical);
        assert!(opts.latency_budget_ms.is_none());
    }

    #[test]
    fn options_deserialize_with_partial_fields() {
        let opts: QueryOptions =
            serde_json::from_str(r#"{"limit": 5, "accuracy_critical": true}"#).unwrap();
        assert_eq!(opts.limit, 5);
        assert!(opts.accuracy_critical);
        assert_eq!(opts.fusion_method, FusionMethod::Rrf);
    }
}
