use crate::tier::Tier;

/// Embedding subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The requested tier (and its one-up retry) could not produce a vector.
    #[error("embedding unavailable: {provider}")]
    Unavailable { provider: String },

    #[error("embedding timed out: tier {tier} exceeded {limit_ms}ms")]
    Timeout { tier: Tier, limit_ms: u64 },

    #[error("inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
