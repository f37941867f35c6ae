//! # sift-core
//!
//! Foundation crate for the sift hybrid retrieval engine.
//! Defines the shared types, traits, errors, and configuration.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod document;
pub mod errors;
pub mod results;
pub mod tier;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::SiftConfig;
pub use document::{Document, StoredDocument};
pub use errors::{SiftError, SiftResult};
pub use results::{FusionMethod, QueryOptions, QueryResponse, SearchResult};
pub use tier::{CalibrationSnapshot, Tier};
