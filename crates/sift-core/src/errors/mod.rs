//! Error taxonomy.
//!
//! One thiserror enum per subsystem, aggregated into the umbrella
//! `SiftError`. Only sparse-index failures are fatal to a query; embedding
//! and dense-path failures are absorbed by the coordinator and degrade to
//! sparse-only results.

mod embedding_error;
mod index_error;
mod storage_error;

pub use embedding_error::EmbeddingError;
pub use index_error::IndexError;
pub use storage_error::StorageError;

/// Umbrella error for the whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {reason}")]
    Config { reason: String },
}

pub type SiftResult<T> = Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_errors_convert_into_umbrella() {
        fn inner() -> SiftResult<()> {
            Err(EmbeddingError::InferenceFailed {
                reason: "boom".to_string(),
            }
            .into())
        }
        let err = inner().unwrap_err();
        assert!(matches!(err, SiftError::Embedding(_)));
        assert_eq!(err.to_string(), "inference failed: boom");
    }
}
