//! Point-in-time admission analytics.

use serde::Serialize;

/// Number of entries kept in each ranking.
pub const TOP_RANKING_SIZE: usize = 10;

/// One ranked `(name, count)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    /// Endpoint label or source id.
    pub name: String,
    /// Counter value.
    pub count: u64,
}

/// Computed analytics view. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    /// Requests counted by the gate.
    pub total_requests: u64,
    /// Requests rejected by the gate.
    pub blocked_requests: u64,
    /// Distinct sources seen by the gate.
    pub unique_sources: u64,
    /// `blocked_requests / total_requests`, zero when nothing was blocked.
    pub block_rate: f64,
    /// Busiest endpoints.
    pub top_endpoints: Vec<RankedCount>,
    /// Sources with the most lifetime violations.
    pub top_violators: Vec<RankedCount>,
}

/// Returns the block rate for the given totals.
#[must_use]
pub fn block_rate(total_requests: u64, blocked_requests: u64) -> f64 {
    if blocked_requests == 0 || total_requests == 0 {
        return 0.0;
    }

    blocked_requests as f64 / total_requests as f64
}

/// Sorts counts descending (ties by name) and keeps the first [`TOP_RANKING_SIZE`].
#[must_use]
pub fn top_ranked(counts: impl IntoIterator<Item = (String, u64)>) -> Vec<RankedCount> {
    let mut ranked: Vec<RankedCount> = counts
        .into_iter()
        .map(|(name, count)| RankedCount { name, count })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.cmp(&right.name))
    });
    ranked.truncate(TOP_RANKING_SIZE);
    ranked
}

#[cfg(test)]
mod tests {
    use super::{block_rate, top_ranked};

    #[test]
    fn block_rate_is_zero_without_blocks() {
        assert_eq!(block_rate(0, 0), 0.0);
        assert_eq!(block_rate(1000, 0), 0.0);
        assert!((block_rate(1000, 50) - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn rankings_keep_top_ten_by_count() {
        let counts = (0..15_u64).map(|index| (format!("/endpoint/{index:02}"), index));

        let ranked = top_ranked(counts);

        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].count, 14);
        assert_eq!(ranked[9].count, 5);
    }
}
