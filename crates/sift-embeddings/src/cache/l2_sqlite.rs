//! L2 SQLite-backed embedding cache.
//!
//! Persists embeddings as `cache_key → blob` rows. Survives process
//! restarts; millisecond access times. All failures degrade to cache
//! misses, since the cache must never take a query down.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::{debug, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS embedding_cache (
        cache_key   TEXT PRIMARY KEY,
        dimensions  INTEGER NOT NULL,
        embedding   BLOB NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    );
";

/// L2 persistent embedding cache. Holds no connection when disabled, so a
/// missing or unopenable database simply means every lookup misses.
pub struct L2SqliteCache {
    conn: Option<Mutex<Connection>>,
}

impl L2SqliteCache {
    /// A cache that never hits, used when L2 is disabled by config.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    /// Open (or create) a file-backed cache. Open failures log a warning
    /// and return a disabled cache rather than erroring.
    pub fn open(path: &Path) -> Self {
        match Connection::open(path).and_then(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        }) {
            Ok(conn) => Self {
                conn: Some(Mutex::new(conn)),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "L2 cache unavailable, continuing without it");
                Self::disabled()
            }
        }
    }

    /// In-memory cache (for testing the L2 code path).
    pub fn open_in_memory() -> Self {
        match Connection::open_in_memory().and_then(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        }) {
            Ok(conn) => Self {
                conn: Some(Mutex::new(conn)),
            },
            Err(_) => Self::disabled(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let conn = self.conn.as_ref()?.lock().ok()?;
        let result = conn.query_row(
            "SELECT dimensions, embedding FROM embedding_cache WHERE cache_key = ?1",
            params![key],
            |row| {
                let dimensions: i64 = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((dimensions as usize, blob))
            },
        );
        match result {
            Ok((dimensions, blob)) => Some(bytes_to_f32_vec(&blob, dimensions)),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                debug!(key, error = %e, "L2 cache read failed, treating as miss");
                None
            }
        }
    }

    pub fn insert(&self, key: &str, embedding: &[f32]) {
        let Some(conn) = self.conn.as_ref() else {
            return;
        };
        let Ok(conn) = conn.lock() else {
            return;
        };
        let blob = f32_vec_to_bytes(embedding);
        if let Err(e) = conn.execute(
            "INSERT INTO embedding_cache (cache_key, dimensions, embedding)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET
                dimensions = excluded.dimensions,
                embedding = excluded.embedding",
            params![key, embedding.len() as i64, blob],
        ) {
            debug!(key, error = %e, "L2 cache write failed");
        }
    }

    /// Number of cached embeddings, 0 when disabled.
    pub fn len(&self) -> usize {
        let Some(conn) = self.conn.as_ref() else {
            return 0;
        };
        let Ok(conn) = conn.lock() else {
            return 0;
        };
        conn.query_row("SELECT COUNT(*) FROM embedding_cache", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_f32_vec(bytes: &[u8], expected_dims: usize) -> Vec<f32> {
    let mut result = Vec::with_capacity(expected_dims);
    for chunk in bytes.chunks_exact(4) {
        result.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    result
}
