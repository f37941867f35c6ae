//! # sift-retrieval
//!
//! The query engine: sparse BM25 + per-tier dense vectors, fused into one
//! ranking, wrapped in a confidence-driven tier-escalation loop.
//!
//! ## Architecture
//!
//! ```text
//! SiftEngine (index / remove / query)
//! ├── SparseIndex
//! │   ├── Tokenizer (lowercase, non-alphanumeric split)
//! │   ├── BM25 scoring (k1=1.2, b=0.75)
//! │   └── Arc-swapped postings, per-document-shard write exclusivity
//! ├── DenseStore
//! │   ├── Per-tier vector maps (never compared across tiers)
//! │   └── Cosine similarity (≤ 0 excluded)
//! ├── Fusion (rrf | weighted | max → one fuse() dispatch)
//! └── RetrievalCoordinator
//!     ├── INIT → EMBEDDING → SEARCHING → FUSING → CONFIDENCE_CHECK
//!     ├── Sparse search ∥ embedding (rayon), dense waits on the vector
//!     ├── Lazy per-tier document embedding on first touch
//!     └── Escalation: FAST → ACCURATE → REMOTE, at most twice
//! ```

pub mod coordinator;
pub mod dense;
pub mod engine;
pub mod fusion;
pub mod sparse;

pub use coordinator::RetrievalCoordinator;
pub use dense::DenseStore;
pub use engine::SiftEngine;
pub use fusion::{fuse, FusedCandidate, ScoredDoc};
pub use sparse::SparseIndex;
