//! Per-tier dense vector store with cosine nearest-neighbor lookup.
//!
//! Tiers are hard-isolated: a search at one tier never sees vectors
//! inserted under another, and dimensionalities differ across tiers so
//! cross-tier comparison is meaningless anyway. Similarity ≤ 0 is treated
//! as no signal and excluded entirely.

use std::sync::Arc;

use dashmap::DashMap;

use sift_core::tier::Tier;

use crate::fusion::ScoredDoc;

/// In-memory per-tier vector maps. Durability is the engine's business;
/// it mirrors every upsert/remove into the document store.
#[derive(Default)]
pub struct DenseStore {
    tiers: [DashMap<String, Arc<Vec<f32>>>; 3],
}

impl DenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tier_map(&self, tier: Tier) -> &DashMap<String, Arc<Vec<f32>>> {
        &self.tiers[tier.index()]
    }

    /// Overwrite-if-present by (document_id, tier).
    pub fn upsert(&self, document_id: &str, tier: Tier, vector: Vec<f32>) {
        self.tier_map(tier)
            .insert(document_id.to_string(), Arc::new(vector));
    }

    /// Drop a document's vectors across all tiers.
    pub fn remove(&self, document_id: &str) {
        for map in &self.tiers {
            map.remove(document_id);
        }
    }

    pub fn contains(&self, tier: Tier, document_id: &str) -> bool {
        self.tier_map(tier).contains_key(document_id)
    }

    /// Number of vectors stored for a tier.
    pub fn len(&self, tier: Tier) -> usize {
        self.tier_map(tier).len()
    }

    pub fn is_empty(&self, tier: Tier) -> bool {
        self.tier_map(tier).is_empty()
    }

    /// Bulk-load persisted vectors for one tier at startup.
    pub fn load(&self, tier: Tier, vectors: Vec<(String, Vec<f32>)>) {
        let map = self.tier_map(tier);
        for (document_id, vector) in vectors {
            map.insert(document_id, Arc::new(vector));
        }
    }

    /// Cosine similarity search among one tier's vectors. An empty tier
    /// yields an empty result, not an error. Ties break by document id
    /// ascending.
    pub fn search(&self, query_vector: &[f32], tier: Tier, limit: usize) -> Vec<ScoredDoc> {
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<ScoredDoc> = self
            .tier_map(tier)
            .iter()
            .filter_map(|entry| {
                // Dimension mismatches carry no signal (stale vectors from
                // a registry change); skip rather than score garbage.
                if entry.value().len() != query_vector.len() {
                    return None;
                }
                let similarity = cosine(query_vector, entry.value());
                if similarity > 0.0 {
                    Some(ScoredDoc {
                        document_id: entry.key().clone(),
                        score: similarity,
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        results.truncate(limit);
        results
    }
}

/// Cosine similarity between two vectors, in f64 for stable ordering.
fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_overwrites_by_id_and_tier() {
        let store = DenseStore::new();
        store.upsert("d1", Tier::Fast, vec![1.0, 0.0]);
        store.upsert("d1", Tier::Fast, vec![0.0, 1.0]);
        assert_eq!(store.len(Tier::Fast), 1);

        let results = store.search(&[0.0, 1.0], Tier::Fast, 10);
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tier_isolation() {
        let store = DenseStore::new();
        store.upsert("d1", Tier::Accurate, vec![1.0, 0.0]);
        // FAST search never returns ACCURATE vectors.
        assert!(store.search(&[1.0, 0.0], Tier::Fast, 10).is_empty());
        assert_eq!(store.search(&[1.0, 0.0], Tier::Accurate, 10).len(), 1);
    }

    #[test]
    fn empty_tier_returns_empty_not_error() {
        let store = DenseStore::new();
        assert!(store.search(&[1.0, 0.0], Tier::Remote, 10).is_empty());
    }

    #[test]
    fn non_positive_similarity_is_excluded() {
        let store = DenseStore::new();
        store.upsert("orthogonal", Tier::Fast, vec![0.0, 1.0]);
        store.upsert("opposite", Tier::Fast, vec![-1.0, 0.0]);
        store.upsert("aligned", Tier::Fast, vec![1.0, 0.0]);

        let results = store.search(&[1.0, 0.0], Tier::Fast, 10);
        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["aligned"]);
    }

    #[test]
    fn results_sorted_desc_with_id_tiebreak() {
        let store = DenseStore::new();
        store.upsert("b", Tier::Fast, vec![1.0, 0.0]);
        store.upsert("a", Tier::Fast, vec![1.0, 0.0]);
        store.upsert("close", Tier::Fast, vec![1.0, 0.5]);

        let results = store.search(&[1.0, 0.0], Tier::Fast, 10);
        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "close"]);
    }

    #[test]
    fn remove_purges_all_tiers() {
        let store = DenseStore::new();
        store.upsert("d1", Tier::Fast, vec![1.0]);
        store.upsert("d1", Tier::Remote, vec![1.0, 2.0]);
        store.remove("d1");
        assert!(store.is_empty(Tier::Fast));
        assert!(store.is_empty(Tier::Remote));
    }

    #[test]
    fn dimension_mismatch_is_skipped() {
        let store = DenseStore::new();
        store.upsert("stale", Tier::Fast, vec![1.0, 0.0, 0.0]);
        assert!(store.search(&[1.0, 0.0], Tier::Fast, 10).is_empty());
    }
}
