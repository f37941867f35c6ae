//! Two-tier embedding cache coordinator.
//!
//! L1 (moka in-memory) → L2 (SQLite persistent). Write-through: on miss,
//! compute the embedding, write to both. Keys carry the tier so vectors
//! from different tiers never collide.

pub mod l1_memory;
pub mod l2_sqlite;

pub use l1_memory::L1MemoryCache;
pub use l2_sqlite::L2SqliteCache;

use tracing::debug;

use sift_core::tier::Tier;

/// Cache key: tier prefix + blake3 of the exact text.
pub fn cache_key(tier: Tier, text: &str) -> String {
    format!("{}:{}", tier.as_str(), blake3::hash(text.as_bytes()).to_hex())
}

/// Result of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHitTier {
    L1,
    L2,
    Miss,
}

/// Orchestrates lookups across both cache tiers.
pub struct CacheCoordinator {
    pub l1: L1MemoryCache,
    pub l2: L2SqliteCache,
}

impl CacheCoordinator {
    /// Create a coordinator with the given L1 capacity and no persistent L2.
    pub fn new(l1_capacity: u64) -> Self {
        Self {
            l1: L1MemoryCache::new(l1_capacity),
            l2: L2SqliteCache::disabled(),
        }
    }

    /// Create a coordinator with a file-backed L2 cache; embeddings survive
    /// process restarts.
    pub fn new_with_db_path(l1_capacity: u64, db_path: &std::path::Path) -> Self {
        Self {
            l1: L1MemoryCache::new(l1_capacity),
            l2: L2SqliteCache::open(db_path),
        }
    }

    /// Look up an embedding by cache key. On L2 hit, promotes to L1.
    pub fn get(&self, key: &str) -> (Option<Vec<f32>>, CacheHitTier) {
        if let Some(vec) = self.l1.get(key) {
            debug!(key, tier = "L1", "embedding cache hit");
            return (Some(vec), CacheHitTier::L1);
        }

        if let Some(vec) = self.l2.get(key) {
            debug!(key, tier = "L2", "embedding cache hit");
            self.l1.insert(key.to_string(), vec.clone());
            return (Some(vec), CacheHitTier::L2);
        }

        (None, CacheHitTier::Miss)
    }

    /// Store an embedding in both tiers (write-through).
    pub fn put(&self, key: String, embedding: &[f32]) {
        self.l1.insert(key.clone(), embedding.to_vec());
        self.l2.insert(&key, embedding);
    }
}
