//! Fusion: merge the sparse and dense ranked lists into one ordering.
//!
//! One `fuse` function dispatching on the `FusionMethod` variant. Both
//! inputs are fused at full candidate depth before the caller truncates;
//! a document present in both lists merges into one candidate carrying
//! both component scores.

use std::collections::HashMap;

use sift_core::results::FusionMethod;

/// One entry of a ranked, scored input list (sorted descending by score).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    pub document_id: String,
    pub score: f64,
}

/// A candidate after fusion.
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    pub document_id: String,
    pub sparse_score: Option<f64>,
    pub dense_score: Option<f64>,
    pub fused_score: f64,
}

#[derive(Default)]
struct Components {
    sparse_score: Option<f64>,
    sparse_rank: Option<usize>,
    dense_score: Option<f64>,
    dense_rank: Option<usize>,
}

/// Fuse two ranked lists. `rrf_k` is the RRF smoothing constant (default
/// 60); ranks are 1-based. Output is sorted by fused score descending,
/// ties broken by document id ascending, and deduplicated by construction.
pub fn fuse(
    method: FusionMethod,
    rrf_k: u32,
    sparse: &[ScoredDoc],
    dense: &[ScoredDoc],
) -> Vec<FusedCandidate> {
    let mut components: HashMap<String, Components> = HashMap::new();

    for (i, doc) in sparse.iter().enumerate() {
        let entry = components.entry(doc.document_id.clone()).or_default();
        entry.sparse_score = Some(doc.score);
        entry.sparse_rank = Some(i + 1);
    }
    for (i, doc) in dense.iter().enumerate() {
        let entry = components.entry(doc.document_id.clone()).or_default();
        entry.dense_score = Some(doc.score);
        entry.dense_rank = Some(i + 1);
    }

    // Normalization divides by the max score within each list; scores are
    // only comparable within one query execution anyway.
    let sparse_max = sparse.first().map(|d| d.score).unwrap_or(0.0);
    let dense_max = dense.first().map(|d| d.score).unwrap_or(0.0);
    let normalize = |score: Option<f64>, max: f64| -> f64 {
        match score {
            Some(s) if max > 0.0 => s / max,
            _ => 0.0,
        }
    };

    let mut candidates: Vec<FusedCandidate> = components
        .into_iter()
        .map(|(document_id, c)| {
            let fused_score = match method {
                FusionMethod::Rrf => {
                    let k = rrf_k as f64;
                    let mut score = 0.0;
                    if let Some(rank) = c.sparse_rank {
                        score += 1.0 / (k + rank as f64);
                    }
                    if let Some(rank) = c.dense_rank {
                        score += 1.0 / (k + rank as f64);
                    }
                    score
                }
                FusionMethod::Weighted { sparse, dense } => {
                    sparse * normalize(c.sparse_score, sparse_max)
                        + dense * normalize(c.dense_score, dense_max)
                }
                FusionMethod::Max => normalize(c.sparse_score, sparse_max)
                    .max(normalize(c.dense_score, dense_max)),
            };
            FusedCandidate {
                document_id,
                sparse_score: c.sparse_score,
                dense_score: c.dense_score,
                fused_score,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(pairs: &[(&str, f64)]) -> Vec<ScoredDoc> {
        pairs
            .iter()
            .map(|(id, score)| ScoredDoc {
                document_id: (*id).to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn rrf_is_exactly_reciprocal_rank_sums() {
        let sparse = scored(&[("a", 5.0), ("b", 3.0)]);
        let dense = scored(&[("b", 0.9), ("a", 0.8), ("c", 0.7)]);
        let fused = fuse(FusionMethod::Rrf, 60, &sparse, &dense);

        let score_of = |id: &str| {
            fused
                .iter()
                .find(|c| c.document_id == id)
                .unwrap()
                .fused_score
        };
        // a: sparse rank 1, dense rank 2.
        assert!((score_of("a") - (1.0 / 61.0 + 1.0 / 62.0)).abs() < 1e-12);
        // b: sparse rank 2, dense rank 1.
        assert!((score_of("b") - (1.0 / 62.0 + 1.0 / 61.0)).abs() < 1e-12);
        // c: dense rank 3 only.
        assert!((score_of("c") - 1.0 / 63.0).abs() < 1e-12);
    }

    #[test]
    fn documents_in_both_lists_merge_into_one_entry() {
        let sparse = scored(&[("a", 2.0)]);
        let dense = scored(&[("a", 0.5)]);
        let fused = fuse(FusionMethod::Rrf, 60, &sparse, &dense);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].sparse_score, Some(2.0));
        assert_eq!(fused[0].dense_score, Some(0.5));
    }

    #[test]
    fn weighted_uses_own_list_max_normalization() {
        let sparse = scored(&[("a", 4.0), ("b", 2.0)]);
        let dense = scored(&[("b", 0.8)]);
        let fused = fuse(
            FusionMethod::Weighted {
                sparse: 0.4,
                dense: 0.6,
            },
            60,
            &sparse,
            &dense,
        );

        let score_of = |id: &str| {
            fused
                .iter()
                .find(|c| c.document_id == id)
                .unwrap()
                .fused_score
        };
        // a: 0.4·(4/4) + 0.6·0 = 0.4
        assert!((score_of("a") - 0.4).abs() < 1e-12);
        // b: 0.4·(2/4) + 0.6·(0.8/0.8) = 0.8
        assert!((score_of("b") - 0.8).abs() < 1e-12);
        assert_eq!(fused[0].document_id, "b");
    }

    #[test]
    fn max_takes_the_stronger_normalized_signal() {
        let sparse = scored(&[("a", 4.0), ("b", 1.0)]);
        let dense = scored(&[("b", 0.9), ("c", 0.45)]);
        let fused = fuse(FusionMethod::Max, 60, &sparse, &dense);

        let score_of = |id: &str| {
            fused
                .iter()
                .find(|c| c.document_id == id)
                .unwrap()
                .fused_score
        };
        assert!((score_of("a") - 1.0).abs() < 1e-12);
        assert!((score_of("b") - 1.0).abs() < 1e-12);
        assert!((score_of("c") - 0.5).abs() < 1e-12);
        // a and b tie at 1.0; id ascending breaks it.
        assert_eq!(fused[0].document_id, "a");
        assert_eq!(fused[1].document_id, "b");
    }

    #[test]
    fn absent_side_contributes_zero_not_nan() {
        let fused = fuse(
            FusionMethod::Weighted {
                sparse: 0.4,
                dense: 0.6,
            },
            60,
            &scored(&[("a", 3.0)]),
            &[],
        );
        assert_eq!(fused.len(), 1);
        assert!((fused[0].fused_score - 0.4).abs() < 1e-12);
        assert!(fused[0].fused_score.is_finite());
    }

    #[test]
    fn both_empty_fuses_to_empty() {
        assert!(fuse(FusionMethod::Rrf, 60, &[], &[]).is_empty());
    }

    #[test]
    fn rrf_and_weighted_differ_but_are_each_valid() {
        // RRF (rank-only) puts c first; weighted (score-aware) puts b first.
        let sparse = scored(&[("a", 5.0), ("b", 4.8), ("c", 1.0)]);
        let dense = scored(&[("c", 0.9), ("b", 0.5)]);

        let rrf = fuse(FusionMethod::Rrf, 60, &sparse, &dense);
        let weighted = fuse(
            FusionMethod::Weighted {
                sparse: 0.4,
                dense: 0.6,
            },
            60,
            &sparse,
            &dense,
        );

        for out in [&rrf, &weighted] {
            // Sorted descending, no duplicates.
            for pair in out.windows(2) {
                assert!(pair[0].fused_score >= pair[1].fused_score);
            }
            let mut ids: Vec<&str> = out.iter().map(|c| c.document_id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), out.len());
        }

        let rrf_order: Vec<&str> = rrf.iter().map(|c| c.document_id.as_str()).collect();
        let weighted_order: Vec<&str> =
            weighted.iter().map(|c| c.document_id.as_str()).collect();
        assert_ne!(rrf_order, weighted_order);
    }
}
