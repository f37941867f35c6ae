//! Sparse-index reload queries. Writes happen inside
//! `document_crud::replace_document`; these are the startup read paths.

use rusqlite::Connection;

use sift_core::errors::SiftResult;
use sift_core::traits::PostingEntry;

use crate::to_storage_err;

/// All posting rows, term-major, for rebuilding the in-memory index.
pub fn load_postings(conn: &Connection) -> SiftResult<Vec<PostingEntry>> {
    let mut stmt = conn
        .prepare("SELECT term, document_id, term_frequency FROM postings ORDER BY term")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PostingEntry {
                term: row.get(0)?,
                document_id: row.get(1)?,
                term_frequency: row.get::<_, i64>(2)? as u32,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut postings = Vec::new();
    for row in rows {
        postings.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }
    Ok(postings)
}

/// All (document_id, token_count) pairs.
pub fn load_document_lengths(conn: &Connection) -> SiftResult<Vec<(String, u32)>> {
    let mut stmt = conn
        .prepare("SELECT document_id, token_count FROM document_lengths")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut lengths = Vec::new();
    for row in rows {
        lengths.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }
    Ok(lengths)
}
