//! # sift-embeddings
//!
//! Tiered embedding generation with calibration and caching.
//!
//! ## Architecture
//!
//! ```text
//! TierResolver
//! ├── Providers (one per tier, IEmbeddingProvider)
//! │   ├── FastLocalProvider (384 dims, hashed unigrams)
//! │   ├── AccurateLocalProvider (768 dims, hashed unigrams+bigrams)
//! │   └── RemoteProvider (1536 dims, HTTP, availability latch)
//! ├── Selection policy (accuracy_critical / text length / latency budget)
//! ├── One-tier-up retry on failure, soft/hard timeouts
//! ├── CalibrationArena (per-tier atomic counters, relaxed ordering)
//! └── CacheCoordinator (L1 moka → L2 SQLite, keyed by tier + text hash)
//! ```

pub mod cache;
pub mod calibration;
pub mod providers;
pub mod registry;
pub mod resolver;

pub use cache::{CacheCoordinator, CacheHitTier};
pub use calibration::CalibrationArena;
pub use providers::{AccurateLocalProvider, FastLocalProvider, RemoteProvider};
pub use registry::TierProfile;
pub use resolver::{Embedding, TierResolver, TierStats};
