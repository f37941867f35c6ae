//! Schema migrations, applied in order and tracked via `PRAGMA user_version`.

mod v001_documents;
mod v002_postings;
mod v003_vectors;
mod v004_calibration;

use rusqlite::Connection;

use sift_core::errors::{SiftError, SiftResult, StorageError};

use crate::to_storage_err;

type Migration = fn(&Connection) -> SiftResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_documents::migrate),
    (2, v002_postings::migrate),
    (3, v003_vectors::migrate),
    (4, v004_calibration::migrate),
];

/// Apply all pending migrations on the given connection.
pub fn run_migrations(conn: &Connection) -> SiftResult<()> {
    let current: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;

    for (version, migrate) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        migrate(conn).map_err(|e| {
            SiftError::from(StorageError::MigrationFailed {
                version: *version,
                reason: e.to_string(),
            })
        })?;
        conn.pragma_update(None, "user_version", version)
            .map_err(|e| to_storage_err(e.to_string()))?;
        tracing::debug!(version, "applied schema migration");
    }

    Ok(())
}

/// The schema version this build expects.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}
