use serde::{Deserialize, Serialize};

use crate::document::{Document, StoredDocument};
use crate::errors::SiftResult;
use crate::tier::{CalibrationSnapshot, Tier};

/// A term and its frequency within one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPosting {
    pub term: String,
    pub term_frequency: u32,
}

/// A full posting row: term → (document, frequency). Used when reloading
/// the sparse index at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingEntry {
    pub term: String,
    pub document_id: String,
    pub term_frequency: u32,
}

/// Durable store for documents, sparse postings, per-tier vectors, and
/// calibration counters, everything keyed by document id. The concrete
/// format is the store's business; callers only rely on durability
/// (calibration counters excepted, which may come back zeroed).
pub trait IDocumentStore: Send + Sync {
    /// Replace a document and its postings atomically. Prior postings and
    /// the length entry for this id are removed first; vectors are NOT
    /// touched (the caller decides whether the text actually changed).
    fn replace_document(
        &self,
        document: &Document,
        content_hash: &str,
        token_count: u32,
        postings: &[TermPosting],
    ) -> SiftResult<()>;

    /// Remove a document, its postings, length entry, and all per-tier
    /// vectors. Removing an unknown id is a no-op.
    fn remove_document(&self, document_id: &str) -> SiftResult<()>;

    fn get_document(&self, document_id: &str) -> SiftResult<Option<StoredDocument>>;

    fn load_documents(&self) -> SiftResult<Vec<StoredDocument>>;

    fn document_count(&self) -> SiftResult<usize>;

    /// All posting rows, for rebuilding the in-memory sparse index.
    fn load_postings(&self) -> SiftResult<Vec<PostingEntry>>;

    /// All (document_id, token_count) pairs.
    fn load_document_lengths(&self) -> SiftResult<Vec<(String, u32)>>;

    /// Upsert a vector keyed by (document_id, tier).
    fn put_vector(&self, document_id: &str, tier: Tier, embedding: &[f32]) -> SiftResult<()>;

    /// Remove all per-tier vectors for a document.
    fn remove_vectors(&self, document_id: &str) -> SiftResult<()>;

    /// All vectors of one tier.
    fn load_vectors(&self, tier: Tier) -> SiftResult<Vec<(String, Vec<f32>)>>;

    fn save_calibration(&self, tier: Tier, snapshot: &CalibrationSnapshot) -> SiftResult<()>;

    fn load_calibration(&self, tier: Tier) -> SiftResult<Option<CalibrationSnapshot>>;
}
