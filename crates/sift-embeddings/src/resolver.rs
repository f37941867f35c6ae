//! TierResolver — tier selection, timeout-bounded embedding, one-tier-up
//! retry, calibration bookkeeping.
//!
//! The resolver exclusively owns the calibration arena: callers report
//! nothing back, every outcome is recorded here at the call site.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use sift_core::config::EmbeddingConfig;
use sift_core::errors::{EmbeddingError, SiftResult};
use sift_core::tier::{CalibrationSnapshot, Tier};
use sift_core::traits::IEmbeddingProvider;

use crate::cache::{self, CacheCoordinator};
use crate::calibration::CalibrationArena;
use crate::providers;
use crate::registry;

/// A produced embedding and where it came from.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Vec<f32>,
    /// The tier that actually produced the vector (may be one above the
    /// requested tier after a retry).
    pub tier_used: Tier,
    pub latency_ms: u64,
}

/// One tier's public stats: registry metadata + live calibration counters.
#[derive(Debug, Clone)]
pub struct TierStats {
    pub tier: Tier,
    pub model_name: &'static str,
    pub dimensions: usize,
    pub available: bool,
    pub calibration: CalibrationSnapshot,
}

/// Chooses and executes an embedding tier for a text, with fallback on
/// failure.
pub struct TierResolver {
    providers: [Arc<dyn IEmbeddingProvider>; 3],
    calibration: CalibrationArena,
    cache: CacheCoordinator,
    config: EmbeddingConfig,
}

impl TierResolver {
    /// Build with the default per-tier providers and an in-memory-only cache.
    pub fn new(config: EmbeddingConfig) -> Self {
        let providers = [
            providers::create_provider(Tier::Fast, &config),
            providers::create_provider(Tier::Accurate, &config),
            providers::create_provider(Tier::Remote, &config),
        ];
        Self::with_providers(config, providers)
    }

    /// Build with a file-backed L2 embedding cache.
    pub fn new_with_db_path(config: EmbeddingConfig, db_path: &std::path::Path) -> Self {
        let providers = [
            providers::create_provider(Tier::Fast, &config),
            providers::create_provider(Tier::Accurate, &config),
            providers::create_provider(Tier::Remote, &config),
        ];
        let cache = if config.l2_cache_enabled {
            CacheCoordinator::new_with_db_path(config.l1_cache_size, db_path)
        } else {
            CacheCoordinator::new(config.l1_cache_size)
        };
        Self {
            providers,
            calibration: CalibrationArena::new(),
            cache,
            config,
        }
    }

    /// Build with explicit providers, ordered [FAST, ACCURATE, REMOTE].
    /// The seam the coordinator tests use to inject mocks.
    pub fn with_providers(
        config: EmbeddingConfig,
        providers: [Arc<dyn IEmbeddingProvider>; 3],
    ) -> Self {
        let cache = CacheCoordinator::new(config.l1_cache_size);
        Self {
            providers,
            calibration: CalibrationArena::new(),
            cache,
            config,
        }
    }

    /// tokens ≈ len/4, the estimate the selection policy runs on.
    pub fn estimated_tokens(text: &str) -> usize {
        text.len() / 4
    }

    /// Whether the remote tier is currently worth trying. Unconfigured and
    /// unreachable are indistinguishable here by design.
    pub fn remote_reachable(&self) -> bool {
        self.providers[Tier::Remote.index()].is_available()
    }

    /// Selection policy, first match wins:
    /// 1. accuracy-critical and remote reachable → REMOTE
    /// 2. long text → ACCURATE
    /// 3. tight latency budget → FAST
    /// 4. default → FAST (escalation is the coordinator's business)
    pub fn select_tier(
        &self,
        text: &str,
        accuracy_critical: bool,
        latency_budget_ms: Option<u64>,
    ) -> Tier {
        if accuracy_critical && self.remote_reachable() {
            return Tier::Remote;
        }
        if Self::estimated_tokens(text) > self.config.long_text_token_threshold {
            return Tier::Accurate;
        }
        if let Some(budget) = latency_budget_ms {
            if budget < self.config.fast_latency_cutoff_ms {
                return Tier::Fast;
            }
        }
        Tier::Fast
    }

    /// Embed at the given tier; on failure retry exactly one tier up.
    /// A REMOTE failure (or a failed retry) is `EmbeddingError::Unavailable`.
    pub fn embed(&self, text: &str, tier: Tier) -> SiftResult<Embedding> {
        match self.embed_bounded(text, tier) {
            Ok((vector, latency_ms)) => Ok(Embedding {
                vector,
                tier_used: tier,
                latency_ms,
            }),
            Err(first_err) => {
                let Some(up) = tier.next() else {
                    return Err(EmbeddingError::Unavailable {
                        provider: self.providers[tier.index()].name().to_string(),
                    }
                    .into());
                };
                warn!(tier = %tier, error = %first_err, "embedding failed, retrying one tier up");
                match self.embed_bounded(text, up) {
                    Ok((vector, latency_ms)) => Ok(Embedding {
                        vector,
                        tier_used: up,
                        latency_ms,
                    }),
                    Err(second_err) => {
                        warn!(tier = %up, error = %second_err, "retry tier failed as well");
                        Err(EmbeddingError::Unavailable {
                            provider: format!(
                                "{} and {} both failed",
                                self.providers[tier.index()].name(),
                                self.providers[up.index()].name()
                            ),
                        }
                        .into())
                    }
                }
            }
        }
    }

    /// Embed pinned to one tier, no retry up. Used for document vectors,
    /// which must carry that tier's dimensionality.
    pub fn embed_for_tier(&self, text: &str, tier: Tier) -> SiftResult<Vec<f32>> {
        self.embed_bounded(text, tier).map(|(vector, _)| vector)
    }

    /// Batch variant of `embed_for_tier`: cached texts are served from the
    /// cache, the rest go through the provider in config-sized chunks.
    /// Results line up with the input order.
    pub fn embed_batch_for_tier(&self, texts: &[String], tier: Tier) -> SiftResult<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut uncached: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = cache::cache_key(tier, text);
            match self.cache.get(&key).0 {
                Some(vec) => results[i] = Some(vec),
                None => uncached.push(i),
            }
        }

        let provider = &self.providers[tier.index()];
        if !uncached.is_empty() && !provider.is_available() {
            self.calibration.record_failure(tier);
            return Err(EmbeddingError::Unavailable {
                provider: provider.name().to_string(),
            }
            .into());
        }

        for chunk in uncached.chunks(self.config.batch_size.max(1)) {
            let batch: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let start = Instant::now();
            match provider.embed_batch(&batch) {
                Ok(vectors) => {
                    let latency = start.elapsed().as_millis() as u64;
                    self.calibration.record_success(tier, latency);
                    for (&i, vector) in chunk.iter().zip(vectors) {
                        self.cache
                            .put(cache::cache_key(tier, &texts[i]), &vector);
                        results[i] = Some(vector);
                    }
                }
                Err(e) => {
                    self.calibration.record_failure(tier);
                    return Err(e);
                }
            }
        }

        Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
    }

    /// Cosine similarity of two texts embedded at the same tier.
    pub fn similarity(&self, a: &str, b: &str, tier: Tier) -> SiftResult<f64> {
        let va = self.embed_for_tier(a, tier)?;
        let vb = self.embed_for_tier(b, tier)?;
        Ok(cosine(&va, &vb))
    }

    /// Registry metadata + live calibration for every tier.
    pub fn stats(&self) -> Vec<TierStats> {
        Tier::ALL
            .iter()
            .map(|&tier| {
                let profile = registry::profile(tier);
                TierStats {
                    tier,
                    model_name: profile.model_name,
                    dimensions: profile.dimensions,
                    available: self.providers[tier.index()].is_available(),
                    calibration: self.calibration.snapshot(tier),
                }
            })
            .collect()
    }

    /// Seed calibration counters from persisted snapshots (startup path).
    pub fn seed_calibration(&self, tier: Tier, snapshot: CalibrationSnapshot) {
        self.calibration.seed(tier, snapshot);
    }

    pub fn calibration_snapshot(&self, tier: Tier) -> CalibrationSnapshot {
        self.calibration.snapshot(tier)
    }

    /// One timeout-bounded provider call with cache and calibration.
    ///
    /// The provider runs on a detached worker thread; the wait is bounded
    /// by the tier's hard timeout (a local inference call can't be
    /// cancelled in-place, so on timeout the thread is abandoned and its
    /// eventual result dropped). Exceeding the soft timeout only warns.
    fn embed_bounded(&self, text: &str, tier: Tier) -> SiftResult<(Vec<f32>, u64)> {
        let profile = registry::profile(tier);
        let key = cache::cache_key(tier, text);

        if let (Some(vector), hit) = self.cache.get(&key) {
            debug!(tier = %tier, ?hit, "embedding served from cache");
            return Ok((vector, 0));
        }

        let provider = Arc::clone(&self.providers[tier.index()]);
        if !provider.is_available() {
            self.calibration.record_failure(tier);
            return Err(EmbeddingError::Unavailable {
                provider: provider.name().to_string(),
            }
            .into());
        }

        let (tx, rx) = mpsc::channel();
        let text_owned = text.to_string();
        std::thread::spawn(move || {
            let start = Instant::now();
            let result = provider.embed(&text_owned);
            let _ = tx.send((result, start.elapsed()));
        });

        match rx.recv_timeout(Duration::from_millis(profile.hard_timeout_ms())) {
            Ok((Ok(vector), elapsed)) => {
                let latency_ms = elapsed.as_millis() as u64;
                if latency_ms > profile.soft_timeout_ms {
                    warn!(
                        tier = %tier,
                        latency_ms,
                        soft_timeout_ms = profile.soft_timeout_ms,
                        "embedding exceeded soft timeout"
                    );
                }
                if vector.len() != profile.dimensions {
                    self.calibration.record_failure(tier);
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: profile.dimensions,
                        actual: vector.len(),
                    }
                    .into());
                }
                self.calibration.record_success(tier, latency_ms);
                self.cache.put(key, &vector);
                Ok((vector, latency_ms))
            }
            Ok((Err(e), _)) => {
                self.calibration.record_failure(tier);
                Err(e)
            }
            Err(_) => {
                self.calibration.record_failure(tier);
                warn!(
                    tier = %tier,
                    limit_ms = profile.hard_timeout_ms(),
                    "embedding hit hard timeout, abandoning call"
                );
                Err(EmbeddingError::Timeout {
                    tier,
                    limit_ms: profile.hard_timeout_ms(),
                }
                .into())
            }
        }
    }
}

/// Cosine similarity in f64 for stable comparisons.
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

    /// A mock provider that always succeeds with fixed dimensions.
    struct SuccessProvider {
        name: String,
        dims: usize,
    }
    impl IEmbeddingProvider for SuccessProvider {
        fn embed(&self, _text: &str) -> SiftResult<Vec<f32>> {
            Ok(vec![1.0; self.dims])
        }
        fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; self.dims]).collect())
        }
        fn dimensions(&self) -> usize {
            self.dims
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    /// A mock provider that always fails.
    struct FailingProvider;
    impl IEmbeddingProvider for FailingProvider {
        fn embed(&self, _text: &str) -> SiftResult<Vec<f32>> {
            Err(EmbeddingError::InferenceFailed {
                reason: "mock failure".to_string(),
            }
            .into())
        }
        fn embed_batch(&self, _texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
            Err(EmbeddingError::InferenceFailed {
                reason: "mock failure".to_string(),
            }
            .into())
        }
        fn dimensions(&self) -> usize {
            0
        }
        fn name(&self) -> &str {
            "failing-mock"
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    /// A mock provider that sleeps past the fast tier's hard timeout.
    struct SlowProvider {
        dims: usize,
        sleep_ms: u64,
    }
    impl IEmbeddingProvider for SlowProvider {
        fn embed(&self, _text: &str) -> SiftResult<Vec<f32>> {
            std::thread::sleep(Duration::from_millis(self.sleep_ms));
            Ok(vec![1.0; self.dims])
        }
        fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
            texts.iter().map(|t| self.embed(t)).collect()
        }
        fn dimensions(&self) -> usize {
            self.dims
        }
        fn name(&self) -> &str {
            "slow-mock"
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    fn mock_resolver(
        fast: Arc<dyn IEmbeddingProvider>,
        accurate: Arc<dyn IEmbeddingProvider>,
        remote: Arc<dyn IEmbeddingProvider>,
    ) -> TierResolver {
        TierResolver::with_providers(EmbeddingConfig::default(), [fast, accurate, remote])
    }

    fn fast_ok() -> Arc<dyn IEmbeddingProvider> {
        Arc::new(SuccessProvider {
            name: "fast-mock".to_string(),
            dims: 384,
        })
    }

    fn accurate_ok() -> Arc<dyn IEmbeddingProvider> {
        Arc::new(SuccessProvider {
            name: "accurate-mock".to_string(),
            dims: 768,
        })
    }

    fn remote_ok() -> Arc<dyn IEmbeddingProvider> {
        Arc::new(SuccessProvider {
            name: "remote-mock".to_string(),
            dims: 1536,
        })
    }

    #[test]
    fn default_selection_is_fast() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        assert_eq!(resolver.select_tier("short query", false, None), Tier::Fast);
    }

    #[test]
    fn accuracy_critical_selects_remote_when_reachable() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        assert_eq!(resolver.select_tier("short query", true, None), Tier::Remote);
    }

    #[test]
    fn accuracy_critical_without_remote_falls_through() {
        struct Unreachable;
        impl IEmbeddingProvider for Unreachable {
            fn embed(&self, _: &str) -> SiftResult<Vec<f32>> {
                Err(EmbeddingError::Unavailable {
                    provider: "unreachable".to_string(),
                }
                .into())
            }
            fn embed_batch(&self, _: &[String]) -> SiftResult<Vec<Vec<f32>>> {
                Err(EmbeddingError::Unavailable {
                    provider: "unreachable".to_string(),
                }
                .into())
            }
            fn dimensions(&self) -> usize {
                1536
            }
            fn name(&self) -> &str {
                "unreachable"
            }
            fn is_available(&self) -> bool {
                false
            }
        }
        let resolver = mock_resolver(fast_ok(), accurate_ok(), Arc::new(Unreachable));
        assert_eq!(resolver.select_tier("short query", true, None), Tier::Fast);
    }

    #[test]
    fn long_text_selects_accurate() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        let long_text = "word ".repeat(5000); // ~6250 estimated tokens
        assert_eq!(resolver.select_tier(&long_text, false, None), Tier::Accurate);
    }

    #[test]
    fn tight_latency_budget_selects_fast() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        assert_eq!(
            resolver.select_tier("short query", false, Some(10)),
            Tier::Fast
        );
    }

    #[test]
    fn embed_reports_requested_tier() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        let embedding = resolver.embed("hello", Tier::Fast).unwrap();
        assert_eq!(embedding.tier_used, Tier::Fast);
        assert_eq!(embedding.vector.len(), 384);
    }

    #[test]
    fn failure_retries_one_tier_up() {
        let resolver = mock_resolver(Arc::new(FailingProvider), accurate_ok(), remote_ok());
        let embedding = resolver.embed("hello", Tier::Fast).unwrap();
        assert_eq!(embedding.tier_used, Tier::Accurate);
        assert_eq!(embedding.vector.len(), 768);

        let snap = resolver.calibration_snapshot(Tier::Fast);
        assert_eq!(snap.failure_count, 1);
        assert_eq!(resolver.calibration_snapshot(Tier::Accurate).success_count, 1);
    }

    #[test]
    fn remote_failure_is_unavailable() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), Arc::new(FailingProvider));
        let err = resolver.embed("hello", Tier::Remote).unwrap_err();
        assert!(matches!(
            err,
            sift_core::SiftError::Embedding(EmbeddingError::Unavailable { .. })
        ));
    }

    #[test]
    fn double_failure_is_unavailable() {
        let resolver =
            mock_resolver(Arc::new(FailingProvider), Arc::new(FailingProvider), remote_ok());
        let err = resolver.embed("hello", Tier::Fast).unwrap_err();
        assert!(matches!(
            err,
            sift_core::SiftError::Embedding(EmbeddingError::Unavailable { .. })
        ));
    }

    #[test]
    fn hard_timeout_counts_as_failure_and_retries_up() {
        // Fast hard timeout is 150ms; this provider sleeps 400ms.
        let slow = Arc::new(SlowProvider {
            dims: 384,
            sleep_ms: 400,
        });
        let resolver = mock_resolver(slow, accurate_ok(), remote_ok());
        let embedding = resolver.embed("hello", Tier::Fast).unwrap();
        assert_eq!(embedding.tier_used, Tier::Accurate);
        assert_eq!(resolver.calibration_snapshot(Tier::Fast).failure_count, 1);
    }

    #[test]
    fn dimension_mismatch_is_a_tier_failure() {
        let wrong_dims = Arc::new(SuccessProvider {
            name: "wrong".to_string(),
            dims: 7,
        });
        let resolver = mock_resolver(wrong_dims, accurate_ok(), remote_ok());
        let embedding = resolver.embed("hello", Tier::Fast).unwrap();
        assert_eq!(embedding.tier_used, Tier::Accurate);
    }

    #[test]
    fn cache_serves_repeat_queries() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        resolver.embed("cached text", Tier::Fast).unwrap();
        resolver.embed("cached text", Tier::Fast).unwrap();
        // Only the first call reached the provider.
        assert_eq!(resolver.calibration_snapshot(Tier::Fast).success_count, 1);
    }

    #[test]
    fn batch_lines_up_with_input_order() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = resolver.embed_batch_for_tier(&texts, Tier::Fast).unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 384));
    }

    #[test]
    fn similarity_of_identical_texts_is_one() {
        let config = EmbeddingConfig::default();
        let resolver = TierResolver::new(config);
        let sim = resolver.similarity("cats are pets", "cats are pets", Tier::Fast).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stats_cover_all_tiers() {
        let resolver = mock_resolver(fast_ok(), accurate_ok(), remote_ok());
        let stats = resolver.stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].tier, Tier::Fast);
        assert_eq!(stats[2].dimensions, 1536);
    }
}
