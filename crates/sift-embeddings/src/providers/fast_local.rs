//! FAST tier: signed feature hashing over unigrams.
//!
//! Each term lands in an FNV-derived bucket with an FNV-derived sign, so
//! collisions partially cancel instead of always inflating a bucket.
//! Deterministic and dependency-free: the always-available floor of the
//! tier ladder.

use std::collections::HashMap;

use sift_core::errors::SiftResult;
use sift_core::tier::Tier;
use sift_core::traits::IEmbeddingProvider;

use crate::registry;

use super::{fnv1a, hash_term, l2_normalize, terms};

/// Fast local embedding provider (384 dimensions).
pub struct FastLocalProvider {
    dimensions: usize,
}

impl FastLocalProvider {
    pub fn new() -> Self {
        Self {
            dimensions: registry::profile(Tier::Fast).dimensions,
        }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let tokens = terms(text);
        let mut vec = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return vec;
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for tok in &tokens {
            *tf.entry(tok.as_str()).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        for (term, count) in &tf {
            let bucket = hash_term(term, self.dimensions);
            // Top hash bit decides the sign.
            let sign = if fnv1a(term.as_bytes()) >> 63 == 0 {
                1.0
            } else {
                -1.0
            };
            vec[bucket] += sign * (count / total);
        }

        l2_normalize(&mut vec);
        vec
    }
}

impl Default for FastLocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IEmbeddingProvider for FastLocalProvider {
    fn embed(&self, text: &str) -> SiftResult<Vec<f32>> {
        Ok(self.encode(text))
    }

    fn embed_batch(&self, texts: &[String]) -> SiftResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        registry::profile(Tier::Fast).model_name
    }

    fn is_available(&self) -> bool {
        true
    }
}
