//! v002: sparse-index tables — postings and per-document length stats.
//! Both cascade on document deletion.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS postings (
            term            TEXT NOT NULL,
            document_id     TEXT NOT NULL,
            term_frequency  INTEGER NOT NULL,
            PRIMARY KEY (term, document_id),
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_postings_document ON postings(document_id);

        CREATE TABLE IF NOT EXISTS document_lengths (
            document_id  TEXT PRIMARY KEY,
            token_count  INTEGER NOT NULL,
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
