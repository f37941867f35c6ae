//! Per-tier provider construction.
//!
//! FAST and ACCURATE are deterministic local hash encoders: always
//! available, no model weights to load. REMOTE is an HTTP provider whose
//! availability depends on configuration and reachability.

pub mod accurate_local;
pub mod fast_local;
pub mod remote;

pub use accurate_local::AccurateLocalProvider;
pub use fast_local::FastLocalProvider;
pub use remote::RemoteProvider;

use std::sync::Arc;

use tracing::info;

use sift_core::config::EmbeddingConfig;
use sift_core::tier::Tier;
use sift_core::traits::IEmbeddingProvider;

/// Build the provider for one tier.
pub fn create_provider(tier: Tier, config: &EmbeddingConfig) -> Arc<dyn IEmbeddingProvider> {
    match tier {
        Tier::Fast => Arc::new(FastLocalProvider::new()),
        Tier::Accurate => Arc::new(AccurateLocalProvider::new()),
        Tier::Remote => {
            let provider = RemoteProvider::from_config(config);
            if provider.is_available() {
                info!(endpoint = %config.remote_endpoint, "remote embedding provider configured");
            } else {
                info!("remote embedding tier unconfigured (no API key)");
            }
            Arc::new(provider)
        }
    }
}

/// Lowercase alphanumeric terms, minimum length 2. Shared by the local
/// hash encoders; distinct from the sparse-index tokenizer on purpose,
/// since embedding inputs drop single-character noise.
pub(crate) fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() >= 2)
        .map(|s| s.to_lowercase())
        .collect()
}

/// FNV-1a hash of a term, reduced to a bucket index.
pub(crate) fn hash_term(term: &str, dims: usize) -> usize {
    (fnv1a(term.as_bytes()) as usize) % dims
}

/// Raw FNV-1a, also used for sign derivation.
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// L2-normalize in place; zero vectors are left untouched.
pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}
