/// Sparse index errors. The sparse index is the guaranteed-available
/// baseline, so these are the only retrieval failures surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("sparse index unavailable: {reason}")]
    Unavailable { reason: String },
}
