//! SiftEngine — the public entry point. Owns the store, the in-memory
//! index structures, and the tier resolver; reloads persisted state on
//! open and mirrors every mutation back into the store.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use sift_core::config::SiftConfig;
use sift_core::document::{Document, StoredDocument};
use sift_core::errors::{IndexError, SiftResult};
use sift_core::results::{QueryOptions, QueryResponse};
use sift_core::tier::Tier;
use sift_core::traits::IDocumentStore;
use sift_embeddings::resolver::{TierResolver, TierStats};
use sift_storage::StorageEngine;

use crate::coordinator::RetrievalCoordinator;
use crate::dense::DenseStore;
use crate::sparse::{tokenizer, SparseIndex};

/// Filename of the L2 embedding cache, kept beside the main database.
const EMBEDDING_CACHE_FILENAME: &str = "embedding_cache.db";

/// The hybrid retrieval engine.
pub struct SiftEngine {
    store: Arc<dyn IDocumentStore>,
    sparse: SparseIndex,
    dense: DenseStore,
    resolver: TierResolver,
    documents: DashMap<String, Arc<StoredDocument>>,
    config: SiftConfig,
}

impl SiftEngine {
    /// Open a file-backed engine rooted at `data_dir`.
    pub fn open(data_dir: &Path, config: SiftConfig) -> SiftResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| IndexError::Unavailable {
            reason: format!("cannot create data dir {}: {e}", data_dir.display()),
        })?;
        let store = StorageEngine::open_with_pool_size(
            &data_dir.join(&config.storage.db_filename),
            config.storage.read_pool_size,
        )?;
        let resolver = TierResolver::new_with_db_path(
            config.embedding.clone(),
            &data_dir.join(EMBEDDING_CACHE_FILENAME),
        );
        Self::with_store_and_resolver(Arc::new(store), resolver, config)
    }

    /// Open an in-memory engine (for testing).
    pub fn open_in_memory(config: SiftConfig) -> SiftResult<Self> {
        let store = StorageEngine::open_in_memory()?;
        let resolver = TierResolver::new(config.embedding.clone());
        Self::with_store_and_resolver(Arc::new(store), resolver, config)
    }

    /// Build from explicit parts and reload persisted state. The seam that
    /// lets tests inject mock providers or failing stores.
    pub fn with_store_and_resolver(
        store: Arc<dyn IDocumentStore>,
        resolver: TierResolver,
        config: SiftConfig,
    ) -> SiftResult<Self> {
        let engine = Self {
            sparse: SparseIndex::new(&config.retrieval),
            dense: DenseStore::new(),
            resolver,
            documents: DashMap::new(),
            config,
            store,
        };
        engine.load_state()?;
        Ok(engine)
    }

    /// Reload documents, postings, vectors, and calibration from the store.
    fn load_state(&self) -> SiftResult<()> {
        // The sparse baseline must load; its absence is fatal.
        let postings = self.store.load_postings().map_err(|e| IndexError::Unavailable {
            reason: format!("cannot load postings: {e}"),
        })?;
        let lengths = self
            .store
            .load_document_lengths()
            .map_err(|e| IndexError::Unavailable {
                reason: format!("cannot load length stats: {e}"),
            })?;
        self.sparse.load(postings, lengths);

        for stored in self.store.load_documents()? {
            self.documents
                .insert(stored.document.id.clone(), Arc::new(stored));
        }

        // Vectors and calibration degrade: missing vectors are re-embedded
        // lazily, missing calibration reseeds from zero.
        for tier in Tier::ALL {
            match self.store.load_vectors(tier) {
                Ok(vectors) => self.dense.load(tier, vectors),
                Err(e) => warn!(tier = %tier, error = %e, "could not load vectors"),
            }
            match self.store.load_calibration(tier) {
                Ok(Some(snapshot)) => self.resolver.seed_calibration(tier, snapshot),
                Ok(None) => {}
                Err(e) => debug!(tier = %tier, error = %e, "could not load calibration"),
            }
        }

        info!(
            documents = self.documents.len(),
            "retrieval engine loaded"
        );
        Ok(())
    }

    /// Index a document. Re-indexing the same id replaces it wholesale;
    /// a changed text additionally purges that id's per-tier vectors so
    /// they are re-embedded on next touch.
    pub fn index(&self, document: Document) -> SiftResult<()> {
        let content_hash = document.content_hash();
        let (postings, token_count) = tokenizer::build_postings(&document.text);
        let text_changed = self
            .documents
            .get(&document.id)
            .map(|existing| existing.content_hash != content_hash)
            .unwrap_or(true);

        self.store
            .replace_document(&document, &content_hash, token_count, &postings)
            .map_err(|e| IndexError::Unavailable {
                reason: e.to_string(),
            })?;

        if text_changed {
            if let Err(e) = self.store.remove_vectors(&document.id) {
                warn!(document_id = %document.id, error = %e, "could not purge stale vectors");
            }
            self.dense.remove(&document.id);
        }

        self.sparse.apply(&document.id, &postings, token_count);
        self.documents.insert(
            document.id.clone(),
            Arc::new(StoredDocument {
                document,
                content_hash,
            }),
        );
        Ok(())
    }

    /// Remove a document: postings, length stats, and all per-tier vectors.
    /// Removing an unknown id is a no-op.
    pub fn remove(&self, document_id: &str) -> SiftResult<()> {
        self.store
            .remove_document(document_id)
            .map_err(|e| IndexError::Unavailable {
                reason: e.to_string(),
            })?;
        self.sparse.remove(document_id);
        self.dense.remove(document_id);
        self.documents.remove(document_id);
        Ok(())
    }

    /// Run a query through the coordinator.
    pub fn query(&self, text: &str, options: &QueryOptions) -> SiftResult<QueryResponse> {
        let coordinator = RetrievalCoordinator::new(
            &self.sparse,
            &self.dense,
            &self.resolver,
            self.store.as_ref(),
            &self.documents,
            &self.config.retrieval,
        );
        coordinator.execute(text, options)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Per-tier registry metadata and live calibration counters.
    pub fn tier_stats(&self) -> Vec<TierStats> {
        self.resolver.stats()
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }
}

impl Drop for SiftEngine {
    /// Persist calibration counters best-effort. Counters may legitimately
    /// reset to zero on restart, so failures only log.
    fn drop(&mut self) {
        for tier in Tier::ALL {
            let snapshot = self.resolver.calibration_snapshot(tier);
            if let Err(e) = self.store.save_calibration(tier, &snapshot) {
                debug!(tier = %tier, error = %e, "could not persist calibration");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::results::FusionMethod;

    fn engine() -> SiftEngine {
        SiftEngine::open_in_memory(SiftConfig::default()).unwrap()
    }

    #[test]
    fn index_and_query_round_trip() {
        let engine = engine();
        engine.index(Document::new("d1", "cats are great pets")).unwrap();
        engine.index(Document::new("d2", "dogs are loyal companions")).unwrap();

        let response = engine.query("cats", &QueryOptions::default()).unwrap();
        assert!(!response.results.is_empty());
        assert_eq!(response.results[0].document_id, "d1");
    }

    #[test]
    fn empty_query_is_not_an_error() {
        let engine = engine();
        engine.index(Document::new("d1", "cats")).unwrap();
        let response = engine.query("   !!! ", &QueryOptions::default()).unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.escalation_count, 0);
    }

    #[test]
    fn query_against_empty_engine_is_empty() {
        let engine = engine();
        let response = engine.query("anything", &QueryOptions::default()).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn remove_then_query_yields_no_hits() {
        let engine = engine();
        engine.index(Document::new("only", "unique marker phrase")).unwrap();
        assert!(!engine.query("marker", &QueryOptions::default()).unwrap().results.is_empty());

        engine.remove("only").unwrap();
        assert!(engine.query("marker", &QueryOptions::default()).unwrap().results.is_empty());
        assert_eq!(engine.document_count(), 0);
    }

    #[test]
    fn results_respect_limit_and_ordering() {
        let engine = engine();
        for doc in test_fixtures::animals_corpus() {
            engine.index(doc).unwrap();
        }
        let options = QueryOptions {
            limit: 2,
            ..Default::default()
        };
        let response = engine.query("cats dogs pets", &options).unwrap();
        assert!(response.results.len() <= 2);
        for pair in response.results.windows(2) {
            assert!(pair[0].fused_score >= pair[1].fused_score);
        }
        assert_eq!(response.results[0].rank, 1);
    }

    #[test]
    fn fusion_method_is_echoed_in_results() {
        let engine = engine();
        engine.index(Document::new("d1", "cats are great pets")).unwrap();
        let options = QueryOptions {
            fusion_method: FusionMethod::Max,
            ..Default::default()
        };
        let response = engine.query("cats", &options).unwrap();
        assert_eq!(response.fusion_method, FusionMethod::Max);
        assert!(response
            .results
            .iter()
            .all(|r| r.fusion_method == FusionMethod::Max));
    }
}
