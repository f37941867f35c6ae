//! Per-tier vector storage. Embeddings are stored as little-endian f32
//! blobs with the dimension count alongside.

use rusqlite::{params, Connection};

use sift_core::errors::SiftResult;
use sift_core::tier::Tier;

use crate::to_storage_err;

/// Upsert a vector keyed by (document_id, tier).
pub fn put_vector(
    conn: &Connection,
    document_id: &str,
    tier: Tier,
    embedding: &[f32],
) -> SiftResult<()> {
    let blob = f32_vec_to_bytes(embedding);
    conn.execute(
        "INSERT INTO vectors (document_id, tier, dimensions, embedding)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(document_id, tier) DO UPDATE SET
            dimensions = excluded.dimensions,
            embedding = excluded.embedding",
        params![document_id, tier.as_str(), embedding.len() as i64, blob],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Remove all per-tier vectors for a document.
pub fn remove_vectors(conn: &Connection, document_id: &str) -> SiftResult<()> {
    conn.execute(
        "DELETE FROM vectors WHERE document_id = ?1",
        params![document_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// All vectors of one tier, ordered by document id for determinism.
pub fn load_vectors(conn: &Connection, tier: Tier) -> SiftResult<Vec<(String, Vec<f32>)>> {
    let mut stmt = conn
        .prepare(
            "SELECT document_id, dimensions, embedding FROM vectors
             WHERE tier = ?1 ORDER BY document_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![tier.as_str()], |row| {
            let document_id: String = row.get(0)?;
            let dimensions: i64 = row.get(1)?;
            let blob: Vec<u8> = row.get(2)?;
            Ok((document_id, dimensions as usize, blob))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut vectors = Vec::new();
    for row in rows {
        let (document_id, dimensions, blob) = row.map_err(|e| to_storage_err(e.to_string()))?;
        vectors.push((document_id, bytes_to_f32_vec(&blob, dimensions)));
    }
    Ok(vectors)
}

/// Convert f32 slice to bytes (little-endian).
pub(crate) fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes back to f32 vec.
pub(crate) fn bytes_to_f32_vec(bytes: &[u8], expected_dims: usize) -> Vec<f32> {
    let mut result = Vec::with_capacity(expected_dims);
    for chunk in bytes.chunks_exact(4) {
        result.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    result
}
