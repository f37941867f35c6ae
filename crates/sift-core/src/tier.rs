use serde::{Deserialize, Serialize};

/// An embedding tier, ordered by increasing cost, latency, and assumed
/// quality. Vectors from different tiers have different dimensionality and
/// are never comparable across tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Fast,
    Accurate,
    Remote,
}

impl Tier {
    /// All tiers, cheapest first.
    pub const ALL: [Tier; 3] = [Tier::Fast, Tier::Accurate, Tier::Remote];

    /// The next tier up, or `None` at the top.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Fast => Some(Tier::Accurate),
            Tier::Accurate => Some(Tier::Remote),
            Tier::Remote => None,
        }
    }

    /// Stable index into per-tier arrays.
    pub fn index(self) -> usize {
        match self {
            Tier::Fast => 0,
            Tier::Accurate => 1,
            Tier::Remote => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Fast => "FAST",
            Tier::Accurate => "ACCURATE",
            Tier::Remote => "REMOTE",
        }
    }

    /// Parse the wire form ("FAST", "ACCURATE", "REMOTE").
    pub fn parse(s: &str) -> Option<Tier> {
        match s {
            "FAST" => Some(Tier::Fast),
            "ACCURATE" => Some(Tier::Accurate),
            "REMOTE" => Some(Tier::Remote),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time view of one tier's calibration counters.
///
/// Counters are statistical, not exact: the live arena is read and written
/// with relaxed ordering by concurrent queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    pub success_count: u64,
    pub failure_count: u64,
    /// Sum of observed latencies across successful calls.
    pub total_latency_ms: u64,
}

impl CalibrationSnapshot {
    /// Mean latency over successful calls, 0.0 when there were none.
    pub fn average_latency_ms(&self) -> f64 {
        if self.success_count == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.success_count as f64
        }
    }
}
