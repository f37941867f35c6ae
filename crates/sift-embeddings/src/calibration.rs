//! Per-tier calibration counters.
//!
//! An arena of atomics indexed by tier, read and written with relaxed
//! ordering. Calibration is statistical; exact real-time precision is not
//! required. The resolver exclusively owns the arena, and callers observe
//! it through snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use sift_core::tier::{CalibrationSnapshot, Tier};

#[derive(Default)]
struct TierCounters {
    success: AtomicU64,
    failure: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Arena of per-tier counters.
#[derive(Default)]
pub struct CalibrationArena {
    tiers: [TierCounters; 3],
}

impl CalibrationArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tier's counters from a persisted snapshot (startup path).
    pub fn seed(&self, tier: Tier, snapshot: CalibrationSnapshot) {
        let counters = &self.tiers[tier.index()];
        counters
            .success
            .store(snapshot.success_count, Ordering::Relaxed);
        counters
            .failure
            .store(snapshot.failure_count, Ordering::Relaxed);
        counters
            .total_latency_ms
            .store(snapshot.total_latency_ms, Ordering::Relaxed);
    }

    pub fn record_success(&self, tier: Tier, latency_ms: u64) {
        let counters = &self.tiers[tier.index()];
        counters.success.fetch_add(1, Ordering::Relaxed);
        counters
            .total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self, tier: Tier) {
        self.tiers[tier.index()]
            .failure
            .fetch_add(1, Ordering::Relaxed);
    }

    /// A point-in-time view of one tier's counters.
    pub fn snapshot(&self, tier: Tier) -> CalibrationSnapshot {
        let counters = &self.tiers[tier.index()];
        CalibrationSnapshot {
            success_count: counters.success.load(Ordering::Relaxed),
            failure_count: counters.failure.load(Ordering::Relaxed),
            total_latency_ms: counters.total_latency_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let arena = CalibrationArena::new();
        arena.record_success(Tier::Fast, 10);
        arena.record_success(Tier::Fast, 30);
        arena.record_failure(Tier::Fast);

        let snap = arena.snapshot(Tier::Fast);
        assert_eq!(snap.success_count, 2);
        assert_eq!(snap.failure_count, 1);
        assert_eq!(snap.total_latency_ms, 40);
        assert_eq!(snap.average_latency_ms(), 20.0);
    }

    #[test]
    fn tiers_are_independent() {
        let arena = CalibrationArena::new();
        arena.record_success(Tier::Accurate, 100);
        assert_eq!(arena.snapshot(Tier::Fast).success_count, 0);
        assert_eq!(arena.snapshot(Tier::Accurate).success_count, 1);
    }

    #[test]
    fn seed_restores_a_snapshot() {
        let arena = CalibrationArena::new();
        arena.seed(
            Tier::Remote,
            CalibrationSnapshot {
                success_count: 5,
                failure_count: 2,
                total_latency_ms: 2500,
            },
        );
        arena.record_success(Tier::Remote, 500);
        let snap = arena.snapshot(Tier::Remote);
        assert_eq!(snap.success_count, 6);
        assert_eq!(snap.total_latency_ms, 3000);
    }

    #[test]
    fn concurrent_updates_do_not_lose_counts() {
        let arena = std::sync::Arc::new(CalibrationArena::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let arena = arena.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    arena.record_success(Tier::Fast, 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(arena.snapshot(Tier::Fast).success_count, 8000);
    }
}
