//! v004: per-tier calibration counters. Best-effort persistence — the
//! resolver tolerates these coming back zeroed after a restart.

use rusqlite::Connection;

use sift_core::errors::SiftResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> SiftResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS calibration (
            tier              TEXT PRIMARY KEY,
            success_count     INTEGER NOT NULL DEFAULT 0,
            failure_count     INTEGER NOT NULL DEFAULT 0,
            total_latency_ms  INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
