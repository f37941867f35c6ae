//! RetrievalCoordinator — drives one query through the state machine
//! `INIT → EMBEDDING → SEARCHING → FUSING → CONFIDENCE_CHECK →
//! {DONE | ESCALATE → EMBEDDING}`.
//!
//! Degradation rules: embedding exhaustion and dense-path failures produce
//! sparse-only results; only sparse-index failure is fatal. Escalation is
//! strictly sequential, so two tiers are never in flight for the same query.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, warn};

use sift_core::config::RetrievalConfig;
use sift_core::document::StoredDocument;
use sift_core::errors::SiftResult;
use sift_core::results::{FusionMethod, QueryOptions, QueryResponse, SearchResult};
use sift_core::tier::Tier;
use sift_core::traits::IDocumentStore;
use sift_embeddings::resolver::{Embedding, TierResolver};

use crate::dense::DenseStore;
use crate::fusion::{self, FusedCandidate, ScoredDoc};
use crate::sparse::{tokenizer, SparseIndex};

/// Query execution states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryState {
    Init,
    Embedding,
    Searching,
    Fusing,
    ConfidenceCheck,
    Done,
}

/// Orchestrates one query end-to-end. One logical task per query;
/// concurrent queries share nothing mutable but the index structures,
/// which are reader-safe.
pub struct RetrievalCoordinator<'a> {
    sparse: &'a SparseIndex,
    dense: &'a DenseStore,
    resolver: &'a TierResolver,
    store: &'a dyn IDocumentStore,
    documents: &'a DashMap<String, Arc<StoredDocument>>,
    config: &'a RetrievalConfig,
}

impl<'a> RetrievalCoordinator<'a> {
    pub fn new(
        sparse: &'a SparseIndex,
        dense: &'a DenseStore,
        resolver: &'a TierResolver,
        store: &'a dyn IDocumentStore,
        documents: &'a DashMap<String, Arc<StoredDocument>>,
        config: &'a RetrievalConfig,
    ) -> Self {
        Self {
            sparse,
            dense,
            resolver,
            store,
            documents,
            config,
        }
    }

    /// Execute one query through the full state machine.
    pub fn execute(&self, query: &str, options: &QueryOptions) -> SiftResult<QueryResponse> {
        let started = Instant::now();

        let mut state = QueryState::Init;
        let mut tier = Tier::Fast;
        let mut escalation_count: u32 = 0;
        // Sparse results are tier-independent; computed once, reused across
        // escalation rounds.
        let mut sparse_results: Option<Vec<ScoredDoc>> = None;
        let mut dense_results: Vec<ScoredDoc> = Vec::new();
        let mut embedding: Option<Embedding> = None;
        let mut fused: Vec<FusedCandidate> = Vec::new();

        loop {
            match state {
                QueryState::Init => {
                    if tokenizer::tokenize(query).is_empty() {
                        debug!("query tokenizes to nothing, returning empty result");
                        return Ok(QueryResponse::empty(Tier::Fast, options.fusion_method));
                    }
                    tier = self.resolver.select_tier(
                        query,
                        options.accuracy_critical,
                        options.latency_budget_ms,
                    );
                    debug!(tier = %tier, "starting tier selected");
                    state = QueryState::Embedding;
                }

                QueryState::Embedding => {
                    // Embedding and sparse search are independent; they
                    // start together. Rounds after the first reuse the
                    // sparse list and only re-embed.
                    let run_sparse = sparse_results.is_none();
                    let (sparse_leg, embed_leg) = rayon::join(
                        || {
                            run_sparse
                                .then(|| self.sparse.search(query, self.config.candidate_limit))
                        },
                        || self.resolver.embed(query, tier),
                    );
                    if let Some(results) = sparse_leg {
                        debug!(candidates = results.len(), "sparse search complete");
                        sparse_results = Some(results);
                    }
                    embedding = match embed_leg {
                        Ok(e) => {
                            debug!(tier_used = %e.tier_used, latency_ms = e.latency_ms, "query embedded");
                            Some(e)
                        }
                        Err(e) => {
                            // All reachable tiers exhausted for this round:
                            // sparse-only, never surfaced to the caller.
                            warn!(error = %e, "embedding unavailable, degrading to sparse-only");
                            None
                        }
                    };
                    state = QueryState::Searching;
                }

                QueryState::Searching => {
                    dense_results = match &embedding {
                        Some(e) => match self.dense_search(e) {
                            Ok(hits) => hits,
                            Err(e) => {
                                warn!(error = %e, "dense search failed, degrading to sparse-only");
                                Vec::new()
                            }
                        },
                        None => Vec::new(),
                    };
                    state = QueryState::Fusing;
                }

                QueryState::Fusing => {
                    let sparse = sparse_results.as_deref().unwrap_or(&[]);
                    fused = fusion::fuse(
                        options.fusion_method,
                        self.config.rrf_k,
                        sparse,
                        &dense_results,
                    );
                    state = QueryState::ConfidenceCheck;
                }

                QueryState::ConfidenceCheck => {
                    let confidence = fused.first().map(|c| c.fused_score).unwrap_or(0.0);
                    let confident = match options.fusion_method {
                        FusionMethod::Rrf => confidence >= self.config.rrf_confidence_floor,
                        _ => confidence >= self.config.confidence_threshold,
                    };
                    // The tier that actually produced the vector governs
                    // escalation: a FAST request already served by ACCURATE
                    // escalates to REMOTE, not back to ACCURATE.
                    let effective_tier = embedding.as_ref().map(|e| e.tier_used).unwrap_or(tier);

                    if !confident
                        && effective_tier != Tier::Remote
                        && escalation_count < self.config.max_escalations
                    {
                        escalation_count += 1;
                        // effective_tier != REMOTE, so a next tier exists.
                        tier = effective_tier.next().unwrap_or(Tier::Remote);
                        debug!(
                            confidence,
                            escalation_count,
                            next_tier = %tier,
                            "low confidence, escalating"
                        );
                        state = QueryState::Embedding;
                    } else {
                        state = QueryState::Done;
                    }
                }

                QueryState::Done => {
                    let tier_used = embedding.as_ref().map(|e| e.tier_used).unwrap_or(tier);
                    let results = self.build_results(&fused, tier_used, options);
                    debug!(
                        results = results.len(),
                        tier_used = %tier_used,
                        escalation_count,
                        "query complete"
                    );
                    return Ok(QueryResponse {
                        results,
                        tier_used,
                        fusion_method: options.fusion_method,
                        escalation_count,
                        total_latency_ms: started.elapsed().as_millis() as u64,
                    });
                }
            }
        }
    }

    /// Dense leg: lazily embed documents the tier hasn't seen, then run the
    /// cosine search. Any failure here is absorbed by the caller.
    fn dense_search(&self, embedding: &Embedding) -> SiftResult<Vec<ScoredDoc>> {
        let tier = embedding.tier_used;
        self.ensure_tier_vectors(tier)?;
        Ok(self
            .dense
            .search(&embedding.vector, tier, self.config.candidate_limit))
    }

    /// A document must be embedded per tier the first time that tier is
    /// used against it. Persist before the in-memory upsert so a storage
    /// failure degrades this query instead of leaving ghost vectors.
    fn ensure_tier_vectors(&self, tier: Tier) -> SiftResult<()> {
        let mut missing: Vec<(String, String)> = self
            .documents
            .iter()
            .filter(|entry| !self.dense.contains(tier, entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().document.text.clone()))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_by(|a, b| a.0.cmp(&b.0));

        let texts: Vec<String> = missing.iter().map(|(_, text)| text.clone()).collect();
        let vectors = self.resolver.embed_batch_for_tier(&texts, tier)?;

        for ((document_id, _), vector) in missing.into_iter().zip(vectors) {
            self.store.put_vector(&document_id, tier, &vector)?;
            self.dense.upsert(&document_id, tier, vector);
        }
        debug!(tier = %tier, "lazily embedded documents for tier");
        Ok(())
    }

    fn build_results(
        &self,
        fused: &[FusedCandidate],
        tier_used: Tier,
        options: &QueryOptions,
    ) -> Vec<SearchResult> {
        fused
            .iter()
            .take(options.limit)
            .enumerate()
            .map(|(i, candidate)| SearchResult {
                document_id: candidate.document_id.clone(),
                sparse_score: candidate.sparse_score,
                dense_score: candidate.dense_score,
                fused_score: candidate.fused_score,
                rank: i + 1,
                tier_used,
                fusion_method: options.fusion_method,
            })
            .collect()
    }
}
