//! Per-tier model metadata: dimensions, context window, latency envelope.
//!
//! Dimensionality differs per tier on purpose: vectors are never
//! comparable across tiers, and a document must be embedded per tier
//! before that tier can search it.

use sift_core::tier::Tier;

/// Static profile of one embedding tier.
#[derive(Debug, Clone, Copy)]
pub struct TierProfile {
    pub tier: Tier,
    pub model_name: &'static str,
    pub dimensions: usize,
    /// Context window in tokens.
    pub context_length: usize,
    /// Expected per-call latency on commodity hardware.
    pub expected_latency_ms: u64,
    /// Exceeding this logs a warning but the result is still used.
    pub soft_timeout_ms: u64,
}

impl TierProfile {
    /// Hard ceiling: exceeding this aborts the wait and counts as a tier
    /// failure.
    pub fn hard_timeout_ms(&self) -> u64 {
        self.soft_timeout_ms * 3
    }
}

pub const PROFILES: [TierProfile; 3] = [
    TierProfile {
        tier: Tier::Fast,
        model_name: "fast-hash-v1",
        dimensions: 384,
        context_length: 512,
        expected_latency_ms: 15,
        soft_timeout_ms: 50,
    },
    TierProfile {
        tier: Tier::Accurate,
        model_name: "accurate-hash-v1",
        dimensions: 768,
        context_length: 8192,
        expected_latency_ms: 100,
        soft_timeout_ms: 200,
    },
    TierProfile {
        tier: Tier::Remote,
        model_name: "text-embedding-3-small",
        dimensions: 1536,
        context_length: 8191,
        expected_latency_ms: 500,
        soft_timeout_ms: 2000,
    },
];

/// Profile lookup by tier.
pub fn profile(tier: Tier) -> &'static TierProfile {
    &PROFILES[tier.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_line_up_with_tier_indexes() {
        for tier in Tier::ALL {
            assert_eq!(profile(tier).tier, tier);
        }
    }

    #[test]
    fn dimensions_increase_with_tier() {
        assert!(profile(Tier::Fast).dimensions < profile(Tier::Accurate).dimensions);
        assert!(profile(Tier::Accurate).dimensions < profile(Tier::Remote).dimensions);
    }

    #[test]
    fn hard_timeout_is_three_times_soft() {
        assert_eq!(profile(Tier::Fast).hard_timeout_ms(), 150);
        assert_eq!(profile(Tier::Accurate).hard_timeout_ms(), 600);
        assert_eq!(profile(Tier::Remote).hard_timeout_ms(), 6000);
    }
}
