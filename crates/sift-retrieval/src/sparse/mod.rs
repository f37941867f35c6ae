//! In-memory sparse index with BM25 scoring.
//!
//! Postings live in a DashMap of `Arc`-swapped vectors: a mutation builds
//! the replacement list and swaps it in whole, so readers holding the old
//! `Arc` never observe a half-updated posting list. Mutations additionally
//! take an exclusive section scoped to the shard owning the document id;
//! reads never take it.

pub mod tokenizer;

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;

use sift_core::config::RetrievalConfig;
use sift_core::traits::{PostingEntry, TermPosting};

use crate::fusion::ScoredDoc;

#[derive(Debug, Clone)]
struct Posting {
    document_id: String,
    term_frequency: u32,
}

/// BM25 inverted index.
pub struct SparseIndex {
    /// term → postings, swapped atomically per mutation.
    postings: DashMap<String, Arc<Vec<Posting>>>,
    /// document → its term postings, for removal and re-index.
    doc_terms: DashMap<String, Arc<Vec<TermPosting>>>,
    /// document → token count.
    doc_lengths: DashMap<String, u32>,
    /// Sum of all token counts, kept consistent with every insert/remove.
    total_tokens: AtomicU64,
    /// Per-document-shard write exclusivity: shard = hash(document_id).
    write_shards: Vec<Mutex<()>>,
    k1: f64,
    b: f64,
}

impl SparseIndex {
    pub fn new(config: &RetrievalConfig) -> Self {
        let shards = config.index_shards.max(1);
        Self {
            postings: DashMap::new(),
            doc_terms: DashMap::new(),
            doc_lengths: DashMap::new(),
            total_tokens: AtomicU64::new(0),
            write_shards: (0..shards).map(|_| Mutex::new(())).collect(),
            k1: config.bm25_k1,
            b: config.bm25_b,
        }
    }

    /// Number of indexed documents.
    pub fn document_count(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    fn shard_lock(&self, document_id: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        document_id.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.write_shards.len();
        self.write_shards[idx]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tokenize and index a document. Convenience over `build_postings` +
    /// `apply` for callers that don't persist.
    pub fn index(&self, document_id: &str, text: &str) -> (Vec<TermPosting>, u32) {
        let (postings, token_count) = tokenizer::build_postings(text);
        self.apply(document_id, &postings, token_count);
        (postings, token_count)
    }

    /// Apply precomputed postings for a document. Idempotent: prior
    /// postings for the id are removed first.
    pub fn apply(&self, document_id: &str, postings: &[TermPosting], token_count: u32) {
        let _guard = self.shard_lock(document_id);
        self.remove_unlocked(document_id);

        for posting in postings {
            let mut next: Vec<Posting> = self
                .postings
                .get(&posting.term)
                .map(|entry| entry.value().as_ref().clone())
                .unwrap_or_default();
            next.push(Posting {
                document_id: document_id.to_string(),
                term_frequency: posting.term_frequency,
            });
            next.sort_by(|a, b| a.document_id.cmp(&b.document_id));
            self.postings
                .insert(posting.term.clone(), Arc::new(next));
        }

        self.doc_terms
            .insert(document_id.to_string(), Arc::new(postings.to_vec()));
        self.doc_lengths
            .insert(document_id.to_string(), token_count);
        self.total_tokens
            .fetch_add(token_count as u64, Ordering::Relaxed);
    }

    /// Remove a document's postings and length stats. Unknown ids are a
    /// no-op.
    pub fn remove(&self, document_id: &str) {
        let _guard = self.shard_lock(document_id);
        self.remove_unlocked(document_id);
    }

    fn remove_unlocked(&self, document_id: &str) {
        let Some((_, terms)) = self.doc_terms.remove(document_id) else {
            return;
        };

        for posting in terms.iter() {
            let next: Option<Arc<Vec<Posting>>> = self.postings.get(&posting.term).map(|entry| {
                Arc::new(
                    entry
                        .value()
                        .iter()
                        .filter(|p| p.document_id != document_id)
                        .cloned()
                        .collect::<Vec<_>>(),
                )
            });
            match next {
                Some(list) if list.is_empty() => {
                    self.postings.remove(&posting.term);
                }
                Some(list) => {
                    self.postings.insert(posting.term.clone(), list);
                }
                None => {}
            }
        }

        if let Some((_, len)) = self.doc_lengths.remove(document_id) {
            self.total_tokens.fetch_sub(len as u64, Ordering::Relaxed);
        }
    }

    /// Bulk-load persisted postings at startup.
    pub fn load(&self, postings: Vec<PostingEntry>, lengths: Vec<(String, u32)>) {
        let mut by_doc: HashMap<String, Vec<TermPosting>> = HashMap::new();
        for entry in postings {
            by_doc.entry(entry.document_id).or_default().push(TermPosting {
                term: entry.term,
                term_frequency: entry.term_frequency,
            });
        }
        let lengths: HashMap<String, u32> = lengths.into_iter().collect();

        for (document_id, mut doc_postings) in by_doc {
            doc_postings.sort_by(|a, b| a.term.cmp(&b.term));
            let token_count = lengths.get(&document_id).copied().unwrap_or(0);
            self.apply(&document_id, &doc_postings, token_count);
        }
    }

    /// BM25 search. Candidates are documents sharing at least one query
    /// term. Empty query after tokenization, or an empty index, returns an
    /// empty list. Ties break by document id ascending for determinism.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredDoc> {
        let mut terms = tokenizer::tokenize(query);
        terms.sort();
        terms.dedup();

        let n = self.doc_lengths.len();
        if terms.is_empty() || n == 0 {
            return Vec::new();
        }
        let n_f = n as f64;
        let avgdl = self.total_tokens.load(Ordering::Relaxed) as f64 / n_f;

        let mut scores: HashMap<String, f64> = HashMap::new();
        for term in &terms {
            let Some(list) = self.postings.get(term).map(|entry| Arc::clone(entry.value()))
            else {
                continue;
            };
            let n_t = list.len() as f64;
            let idf = (1.0 + (n_f - n_t + 0.5) / (n_t + 0.5)).ln();

            for posting in list.iter() {
                let tf = posting.term_frequency as f64;
                let doc_len = self
                    .doc_lengths
                    .get(&posting.document_id)
                    .map(|len| *len)
                    .unwrap_or(0) as f64;
                let denom = tf + self.k1 * (1.0 - self.b + self.b * doc_len / avgdl);
                let contribution = idf * tf * (self.k1 + 1.0) / denom;
                *scores.entry(posting.document_id.clone()).or_default() += contribution;
            }
        }

        let mut results: Vec<ScoredDoc> = scores
            .into_iter()
            .map(|(document_id, score)| ScoredDoc { document_id, score })
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
