//! StorageEngine — owns the ConnectionPool, implements `IDocumentStore`,
//! runs migrations at startup.

use std::path::Path;

use tracing::info;

use sift_core::document::{Document, StoredDocument};
use sift_core::errors::SiftResult;
use sift_core::tier::{CalibrationSnapshot, Tier};
use sift_core::traits::{IDocumentStore, PostingEntry, TermPosting};

use crate::migrations;
use crate::pool::ConnectionPool;

/// The main storage engine. Owns the connection pool and provides the full
/// `IDocumentStore` interface.
pub struct StorageEngine {
    pool: ConnectionPool,
    /// When true, use the read pool for read operations (file-backed mode).
    /// When false, route all reads through the writer (in-memory mode,
    /// because in-memory read pool connections are isolated databases).
    use_read_pool: bool,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path) -> SiftResult<Self> {
        Self::open_with_pool_size(path, sift_core::config::defaults::DEFAULT_READ_POOL_SIZE)
    }

    /// Open with an explicit read pool size.
    pub fn open_with_pool_size(path: &Path, read_pool_size: usize) -> SiftResult<Self> {
        // Writer first: Connection::open creates the file, so the read-only
        // pool can attach afterwards.
        let pool = ConnectionPool::open(path, read_pool_size)?;
        let engine = Self {
            pool,
            use_read_pool: true,
        };
        engine.initialize()?;
        info!(path = %path.display(), "storage engine opened");
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    /// Routes all reads through the writer since in-memory read pool
    /// connections are isolated databases that can't see writer's changes.
    pub fn open_in_memory() -> SiftResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let engine = Self {
            pool,
            use_read_pool: false,
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Run migrations on the write connection.
    fn initialize(&self) -> SiftResult<()> {
        self.pool.writer.with_conn(migrations::run_migrations)
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a read-only query on the best available connection.
    fn with_reader<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> SiftResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }
}

impl IDocumentStore for StorageEngine {
    fn replace_document(
        &self,
        document: &Document,
        content_hash: &str,
        token_count: u32,
        postings: &[TermPosting],
    ) -> SiftResult<()> {
        self.pool.writer.with_conn(|conn| {
            crate::queries::document_crud::replace_document(
                conn,
                document,
                content_hash,
                token_count,
                postings,
            )
        })
    }

    fn remove_document(&self, document_id: &str) -> SiftResult<()> {
        self.pool
            .writer
            .with_conn(|conn| crate::queries::document_crud::remove_document(conn, document_id))
    }

    fn get_document(&self, document_id: &str) -> SiftResult<Option<StoredDocument>> {
        self.with_reader(|conn| crate::queries::document_crud::get_document(conn, document_id))
    }

    fn load_documents(&self) -> SiftResult<Vec<StoredDocument>> {
        self.with_reader(crate::queries::document_crud::load_documents)
    }

    fn document_count(&self) -> SiftResult<usize> {
        self.with_reader(crate::queries::document_crud::document_count)
    }

    fn load_postings(&self) -> SiftResult<Vec<PostingEntry>> {
        self.with_reader(crate::queries::posting_ops::load_postings)
    }

    fn load_document_lengths(&self) -> SiftResult<Vec<(String, u32)>> {
        self.with_reader(crate::queries::posting_ops::load_document_lengths)
    }

    fn put_vector(&self, document_id: &str, tier: Tier, embedding: &[f32]) -> SiftResult<()> {
        self.pool.writer.with_conn(|conn| {
            crate::queries::vector_ops::put_vector(conn, document_id, tier, embedding)
        })
    }

    fn remove_vectors(&self, document_id: &str) -> SiftResult<()> {
        self.pool
            .writer
            .with_conn(|conn| crate::queries::vector_ops::remove_vectors(conn, document_id))
    }

    fn load_vectors(&self, tier: Tier) -> SiftResult<Vec<(String, Vec<f32>)>> {
        self.with_reader(|conn| crate::queries::vector_ops::load_vectors(conn, tier))
    }

    fn save_calibration(&self, tier: Tier, snapshot: &CalibrationSnapshot) -> SiftResult<()> {
        self.pool.writer.with_conn(|conn| {
            crate::queries::calibration_ops::save_calibration(conn, tier, snapshot)
        })
    }

    fn load_calibration(&self, tier: Tier) -> SiftResult<Option<CalibrationSnapshot>> {
        self.with_reader(|conn| crate::queries::calibration_ops::load_calibration(conn, tier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, text)
    }

    fn postings_of(pairs: &[(&str, u32)]) -> Vec<TermPosting> {
        pairs
            .iter()
            .map(|(term, tf)| TermPosting {
                term: (*term).to_string(),
                term_frequency: *tf,
            })
            .collect()
    }

    #[test]
    fn replace_and_get_round_trip() {
        let store = StorageEngine::open_in_memory().unwrap();
        let d = doc("d1", "cats are great pets");
        store
            .replace_document(
                &d,
                &d.content_hash(),
                4,
                &postings_of(&[("cats", 1), ("are", 1), ("great", 1), ("pets", 1)]),
            )
            .unwrap();

        let stored = store.get_document("d1").unwrap().unwrap();
        assert_eq!(stored.document.text, "cats are great pets");
        assert_eq!(stored.content_hash, d.content_hash());
        assert_eq!(store.document_count().unwrap(), 1);
    }

    #[test]
    fn reindex_replaces_postings() {
        let store = StorageEngine::open_in_memory().unwrap();
        let d = doc("d1", "old words");
        store
            .replace_document(&d, &d.content_hash(), 2, &postings_of(&[("old", 1), ("words", 1)]))
            .unwrap();

        let d2 = doc("d1", "new words");
        store
            .replace_document(&d2, &d2.content_hash(), 2, &postings_of(&[("new", 1), ("words", 1)]))
            .unwrap();

        let postings = store.load_postings().unwrap();
        assert_eq!(postings.len(), 2);
        assert!(postings.iter().all(|p| p.term != "old"));
    }

    #[test]
    fn remove_cascades_postings_and_vectors() {
        let store = StorageEngine::open_in_memory().unwrap();
        let d = doc("d1", "cats");
        store
            .replace_document(&d, &d.content_hash(), 1, &postings_of(&[("cats", 1)]))
            .unwrap();
        store.put_vector("d1", Tier::Fast, &[0.5, 0.5]).unwrap();

        store.remove_document("d1").unwrap();
        assert!(store.get_document("d1").unwrap().is_none());
        assert!(store.load_postings().unwrap().is_empty());
        assert!(store.load_vectors(Tier::Fast).unwrap().is_empty());
    }

    #[test]
    fn removing_unknown_id_is_a_noop() {
        let store = StorageEngine::open_in_memory().unwrap();
        store.remove_document("ghost").unwrap();
    }

    #[test]
    fn vectors_are_tier_scoped() {
        let store = StorageEngine::open_in_memory().unwrap();
        let d = doc("d1", "cats");
        store
            .replace_document(&d, &d.content_hash(), 1, &postings_of(&[("cats", 1)]))
            .unwrap();

        store.put_vector("d1", Tier::Fast, &[1.0, 0.0]).unwrap();
        store.put_vector("d1", Tier::Accurate, &[0.0, 1.0, 0.0]).unwrap();

        let fast = store.load_vectors(Tier::Fast).unwrap();
        assert_eq!(fast.len(), 1);
        assert_eq!(fast[0].1, vec![1.0, 0.0]);
        assert!(store.load_vectors(Tier::Remote).unwrap().is_empty());
    }

    #[test]
    fn calibration_round_trip() {
        let store = StorageEngine::open_in_memory().unwrap();
        assert!(store.load_calibration(Tier::Fast).unwrap().is_none());

        let snap = CalibrationSnapshot {
            success_count: 10,
            failure_count: 2,
            total_latency_ms: 420,
        };
        store.save_calibration(Tier::Fast, &snap).unwrap();
        assert_eq!(store.load_calibration(Tier::Fast).unwrap(), Some(snap));
    }
}
