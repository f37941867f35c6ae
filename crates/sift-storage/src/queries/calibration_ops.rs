//! Calibration counter persistence. Best-effort: the resolver reseeds
//! from zero when a row is missing.

use rusqlite::{params, Connection};

use sift_core::errors::SiftResult;
use sift_core::tier::{CalibrationSnapshot, Tier};

use crate::to_storage_err;

pub fn save_calibration(
    conn: &Connection,
    tier: Tier,
    snapshot: &CalibrationSnapshot,
) -> SiftResult<()> {
    conn.execute(
        "INSERT INTO calibration (tier, success_count, failure_count, total_latency_ms)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(tier) DO UPDATE SET
            success_count = excluded.success_count,
            failure_count = excluded.failure_count,
            total_latency_ms = excluded.total_latency_ms",
        params![
            tier.as_str(),
            snapshot.success_count as i64,
            snapshot.failure_count as i64,
            snapshot.total_latency_ms as i64,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn load_calibration(conn: &Connection, tier: Tier) -> SiftResult<Option<CalibrationSnapshot>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT success_count, failure_count, total_latency_ms
             FROM calibration WHERE tier = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![tier.as_str()])
        .map_err(|e| to_storage_err(e.to_string()))?;

    match rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        Some(row) => {
            let success_count: i64 = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
            let failure_count: i64 = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
            let total_latency_ms: i64 = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
            Ok(Some(CalibrationSnapshot {
                success_count: success_count as u64,
                failure_count: failure_count as u64,
                total_latency_ms: total_latency_ms as u64,
            }))
        }
        None => Ok(None),
    }
}
