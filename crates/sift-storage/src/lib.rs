//! # sift-storage
//!
//! Durable state behind the `IDocumentStore` trait: documents, sparse
//! postings + length stats, per-tier vectors, and calibration counters,
//! all in SQLite. Connection handling is a single serialized writer plus a
//! round-robin pool of read connections (WAL keeps readers unblocked).

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use sift_core::errors::{SiftError, StorageError};

/// Wrap a low-level SQLite error message into the workspace error type.
pub(crate) fn to_storage_err(message: String) -> SiftError {
    StorageError::Sqlite { message }.into()
}
