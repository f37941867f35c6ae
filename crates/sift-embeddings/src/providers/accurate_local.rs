//! ACCURATE tier: hashed unigrams + bigrams with an IDF-style length
//! weight.
//!
//! Twice the dimensionality of the fast tier and a richer feature set
//! (bigrams capture local word order), at roughly double the cost. Still
//! deterministic and always available.

use std::collections::HashMap;

use sift_core::errors::SiftResult;
use sift_core::tier::Tier;
use sift_core::traits::IEmbeddingProvider;

use crate::registry;

use super::{fnv1a, hash_term, l2_normalize, terms};

/// Accurate local embedding provider (768 dimensions).
pub struct AccurateLocalProvider {
    dimensions: usize,
}

impl AccurateLocalProvider {
    pub fn new() -> Self {
        Self {
            dimensions: registry::profile(Tier::Accurate).dimensions,
        }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let tokens = terms(text);
        let mut vec = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return vec;
        }

        let mut features: HashMap<String, f32> = HashMap::new();
        for tok in &tokens {
            *features.entry(tok.clone()).or_default() += 1.0;
        }
        for pair in tokens.windows(2) {
            *features.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        for (feature, count) in &features {
            let freq = count / total;
            // Longer features are rarer; weight them up as a cheap IDF stand-in.
            let weight = 1.0 + (feature.len() as f32).ln();
            let bucket = hash_term(feature, self.dimensions);
            let sign = if fnv1a(feature.as_bytes()) >> 63 == 0 {
                1.0
            } else {
                -1.0
            };
            vec[bucket] += sign * freq * weight;
        }

        l2_normalize(&mut vec);
        vec
    }
}

impl Default for AccurateLocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IEmbeddingProvider for AccurateLocalProvider {
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
        registry::profile(Tier::Accurate).model_name
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_registry_dimensions() {
        let p = AccurateLocalProvider::new();
        assert_eq!(p.embed("hello world").unwrap().len(), 768);
    }

    #[test]
    fn dimensionality_differs_from_fast_tier() {
        let accurate = AccurateLocalProvider::new();
        let fast = super::super::FastLocalProvider::new();
        assert_ne!(accurate.dimensions(), fast.dimensions());
    }

    #[test]
    fn word_order_matters() {
        let p = AccurateLocalProvider::new();
        let a = p.embed("dog bites man").unwrap();
        let b = p.embed("man bites dog").unwrap();
        // Same unigrams, different bigrams.
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_unit_norm() {
        let p = AccurateLocalProvider::new();
        let v = p.embed("retrieval quality over latency").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn deterministic() {
        let p = AccurateLocalProvider::new();
        assert_eq!(p.embed("stable").unwrap(), p.embed("stable").unwrap());
    }
}
