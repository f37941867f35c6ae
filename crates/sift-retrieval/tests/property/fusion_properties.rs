//! Property tests: fusion output invariants hold for arbitrary ranked
//! inputs, BM25 is monotone in term frequency, RRF matches its closed form.

use proptest::prelude::*;

use sift_core::config::RetrievalConfig;
use sift_core::results::FusionMethod;
use sift_retrieval::fusion::{fuse, ScoredDoc};
use sift_retrieval::SparseIndex;

/// A ranked list: unique ids, scores strictly descending.
fn ranked_list(prefix: &'static str, max_len: usize) -> impl Strategy<Value = Vec<ScoredDoc>> {
    (0..=max_len).prop_flat_map(move |len| {
        proptest::collection::vec(0.001f64..1.0, len).prop_map(move |mut scores| {
            scores.sort_by(|a, b| b.partial_cmp(a).unwrap());
            scores
                .into_iter()
                .enumerate()
                .map(|(i, score)| ScoredDoc {
                    document_id: format!("{prefix}-{i:03}"),
                    score,
                })
                .collect()
        })
    })
}

fn any_method() -> impl Strategy<Value = FusionMethod> {
    prop_oneof![
        Just(FusionMethod::Rrf),
        Just(FusionMethod::Weighted {
            sparse: 0.4,
            dense: 0.6
        }),
        Just(FusionMethod::Max),
    ]
}

proptest! {
    #[test]
    fn fused_output_is_sorted_and_deduped(
        method in any_method(),
        sparse in ranked_list("s", 15),
        dense in ranked_list("d", 15),
    ) {
        let fused = fuse(method, 60, &sparse, &dense);

        for pair in fused.windows(2) {
            prop_assert!(pair[0].fused_score >= pair[1].fused_score);
        }

        let mut ids: Vec<&str> = fused.iter().map(|c| c.document_id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }

    #[test]
    fn fused_output_never_exceeds_input_union(
        method in any_method(),
        sparse in ranked_list("s", 15),
        dense in ranked_list("d", 15),
    ) {
        let fused = fuse(method, 60, &sparse, &dense);
        prop_assert!(fused.len() <= sparse.len() + dense.len());
    }

    #[test]
    fn overlapping_ids_merge(
        sparse in ranked_list("x", 10),
    ) {
        // Feed the same list as both sources: every entry overlaps.
        let fused = fuse(FusionMethod::Rrf, 60, &sparse, &sparse);
        prop_assert_eq!(fused.len(), sparse.len());
        for candidate in &fused {
            prop_assert!(candidate.sparse_score.is_some());
            prop_assert!(candidate.dense_score.is_some());
        }
    }

    #[test]
    fn rrf_matches_closed_form(r1 in 1usize..20, r2 in 1usize..20) {
        // Build lists placing "target" at rank r1 (sparse) and r2 (dense).
        let sparse: Vec<ScoredDoc> = (1..=r1)
            .map(|i| ScoredDoc {
                document_id: if i == r1 { "target".to_string() } else { format!("s-{i:03}") },
                score: (21 - i) as f64,
            })
            .collect();
        let dense: Vec<ScoredDoc> = (1..=r2)
            .map(|i| ScoredDoc {
                document_id: if i == r2 { "target".to_string() } else { format!("d-{i:03}") },
                score: (21 - i) as f64 / 21.0,
            })
            .collect();

        let fused = fuse(FusionMethod::Rrf, 60, &sparse, &dense);
        let target = fused.iter().find(|c| c.document_id == "target").unwrap();
        let expected = 1.0 / (60.0 + r1 as f64) + 1.0 / (60.0 + r2 as f64);
        prop_assert!((target.fused_score - expected).abs() < 1e-12);
    }

    #[test]
    fn weighted_and_max_scores_stay_in_unit_range(
        sparse in ranked_list("s", 15),
        dense in ranked_list("d", 15),
    ) {
        for method in [FusionMethod::Weighted { sparse: 0.4, dense: 0.6 }, FusionMethod::Max] {
            let fused = fuse(method, 60, &sparse, &dense);
            for candidate in &fused {
                prop_assert!(candidate.fused_score >= 0.0);
                prop_assert!(candidate.fused_score <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn bm25_is_monotone_in_term_frequency(
        low_tf in 1u32..10,
        delta in 1u32..10,
        filler in 1u32..10,
    ) {
        let high_tf = low_tf + delta;
        let length = high_tf + filler;

        // Two documents of identical length; only the tf of "target" varies.
        let make_text = |tf: u32| {
            let mut words = vec!["target"; tf as usize];
            words.extend(std::iter::repeat("filler").take((length - tf) as usize));
            words.join(" ")
        };

        let index = SparseIndex::new(&RetrievalConfig::default());
        index.index("doc-low", &make_text(low_tf));
        index.index("doc-high", &make_text(high_tf));

        let results = index.search("target", 10);
        prop_assert_eq!(results.len(), 2);
        prop_assert_eq!(results[0].document_id.as_str(), "doc-high");
        prop_assert!(results[0].score > results[1].score);
    }
}
