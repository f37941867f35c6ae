//! Document CRUD plus the atomic replace-with-postings write path.

use chrono::DateTime;
use rusqlite::{params, Connection};

use sift_core::document::{Document, StoredDocument};
use sift_core::errors::SiftResult;
use sift_core::traits::TermPosting;

use crate::to_storage_err;

/// Replace a document and its postings atomically.
/// Wrapped in a SAVEPOINT: document row + posting purge + re-insert + length
/// row are all-or-nothing. Vectors are left alone; the engine removes them
/// separately when the content hash actually changed.
pub fn replace_document(
    conn: &Connection,
    document: &Document,
    content_hash: &str,
    token_count: u32,
    postings: &[TermPosting],
) -> SiftResult<()> {
    conn.execute_batch("SAVEPOINT replace_doc")
        .map_err(|e| to_storage_err(format!("replace_document savepoint: {e}")))?;

    match replace_document_inner(conn, document, content_hash, token_count, postings) {
        Ok(()) => {
            conn.execute_batch("RELEASE replace_doc")
                .map_err(|e| to_storage_err(format!("replace_document release: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK TO replace_doc");
            let _ = conn.execute_batch("RELEASE replace_doc");
            Err(e)
        }
    }
}

fn replace_document_inner(
    conn: &Connection,
    document: &Document,
    content_hash: &str,
    token_count: u32,
    postings: &[TermPosting],
) -> SiftResult<()> {
    let metadata = serde_json::to_string(&document.metadata)?;

    conn.execute(
        "INSERT INTO documents (id, text, metadata, content_hash, indexed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            text = excluded.text,
            metadata = excluded.metadata,
            content_hash = excluded.content_hash,
            indexed_at = excluded.indexed_at",
        params![
            document.id,
            document.text,
            metadata,
            content_hash,
            document.indexed_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    // Idempotent re-index: prior postings go first.
    conn.execute(
        "DELETE FROM postings WHERE document_id = ?1",
        params![document.id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO postings (term, document_id, term_frequency) VALUES (?1, ?2, ?3)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    for posting in postings {
        stmt.execute(params![posting.term, document.id, posting.term_frequency])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }

    conn.execute(
        "INSERT INTO document_lengths (document_id, token_count) VALUES (?1, ?2)
         ON CONFLICT(document_id) DO UPDATE SET token_count = excluded.token_count",
        params![document.id, token_count],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(())
}

/// Delete a document. Postings, length stats, and vectors cascade.
/// Deleting an unknown id is a no-op.
pub fn remove_document(conn: &Connection, document_id: &str) -> SiftResult<()> {
    conn.execute("DELETE FROM documents WHERE id = ?1", params![document_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get_document(conn: &Connection, document_id: &str) -> SiftResult<Option<StoredDocument>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, text, metadata, content_hash, indexed_at FROM documents WHERE id = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![document_id])
        .map_err(|e| to_storage_err(e.to_string()))?;

    match rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        Some(row) => Ok(Some(row_to_stored_document(row)?)),
        None => Ok(None),
    }
}

pub fn load_documents(conn: &Connection) -> SiftResult<Vec<StoredDocument>> {
    let mut stmt = conn
        .prepare("SELECT id, text, metadata, content_hash, indexed_at FROM documents ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt.query([]).map_err(|e| to_storage_err(e.to_string()))?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        documents.push(row_to_stored_document(row)?);
    }
    Ok(documents)
}

pub fn document_count(conn: &Connection) -> SiftResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

fn row_to_stored_document(row: &rusqlite::Row<'_>) -> SiftResult<StoredDocument> {
    let id: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let text: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let metadata_json: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let content_hash: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let indexed_at: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;

    let metadata = serde_json::from_str(&metadata_json)?;
    let indexed_at = DateTime::parse_from_rfc3339(&indexed_at)
        .map_err(|e| to_storage_err(format!("bad indexed_at for {id}: {e}")))?
        .with_timezone(&chrono::Utc);

    Ok(StoredDocument {
        document: Document {
            id,
            text,
            metadata,
            indexed_at,
        },
        content_hash,
    })
}
