//! Query modules, one per concern. All functions take a borrowed
//! `rusqlite::Connection`; transaction scoping is the caller's job except
//! where a SAVEPOINT is documented.

pub mod calibration_ops;
pub mod document_crud;
pub mod posting_ops;
pub mod vector_ops;
