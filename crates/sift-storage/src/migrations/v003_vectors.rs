//! v003: per-tier embedding vectors, keyed by (document_id, tier).
//! Dimensions are stored alongside the blob so tier mismatches can be
//! skipped without deserializing.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS vectors (
            document_id  TEXT NOT NULL,
            tier         TEXT NOT NULL,
            dimensions   INTEGER NOT NULL,
            embedding    BLOB NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (document_id, tier),
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_vectors_tier ON vectors(tier);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
