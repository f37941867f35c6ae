//! Configuration: per-subsystem serde structs with a `defaults` module as
//! the single source of truth. Every field falls back individually via
//! `#[serde(default)]`, so partial TOML files are fine.

pub mod defaults;

mod embedding_config;
mod retrieval_config;
mod storage_config;

pub use embedding_config::EmbeddingConfig;
pub use retrieval_config::RetrievalConfig;
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{SiftError, SiftResult};

/// Top-level configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
}

impl SiftConfig {
    /// Parse a TOML document. Unknown keys are ignored, missing keys take
    /// their defaults.
    pub fn from_toml_str(s: &str) -> SiftResult<Self> {
        toml::from_str(s).map_err(|e| SiftError::Config {
            reason: e.to_string(),
        })
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> SiftResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SiftError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }
}
