//! v001: documents table — the root row every other table hangs off.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id            TEXT PRIMARY KEY,
            text          TEXT NOT NULL,
            metadata      TEXT NOT NULL DEFAULT 'null',
            content_hash  TEXT NOT NULL,
            indexed_at    TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
