//! # Routing Statistics
//! Process-lifetime counters over routing outcomes. Injected into the router
//! at construction and shared as `Arc`, so routers stay testable in isolation
//! and increments stay atomic under concurrent routing.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::source::DataSource;

#[derive(Debug, Default)]
pub struct RoutingStatistics {
    total: AtomicU64,
    historical: AtomicU64,
    live: AtomicU64,
    unknown: AtomicU64,
    overrides: AtomicU64,
    ambiguous: AtomicU64,
}

/// Read-only copy of the counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub historical: u64,
    pub live: u64,
    pub unknown: u64,
    pub overrides: u64,
    pub ambiguous: u64,
}

impl RoutingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one routing outcome. The per-source counter reflects the
    /// *resulting* source (post-override); `manual_override` and `ambiguous`
    /// are mutually exclusive by router precedence.
    pub fn record(&self, source: DataSource, manual_override: bool, ambiguous: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match source {
            DataSource::HistoricalApi => self.historical.fetch_add(1, Ordering::Relaxed),
            DataSource::LiveStt => self.live.fetch_add(1, Ordering::Relaxed),
            DataSource::Unknown => self.unknown.fetch_add(1, Ordering::Relaxed),
        };
        if manual_override {
            self.overrides.fetch_add(1, Ordering::Relaxed);
        }
        if ambiguous {
            self.ambiguous.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            historical: self.historical.load(Ordering::Relaxed),
            live: self.live.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            overrides: self.overrides.load(Ordering::Relaxed),
            ambiguous: self.ambiguous.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_source() {
        let stats = RoutingStatistics::new();
        stats.record(DataSource::HistoricalApi, false, false);
        stats.record(DataSource::LiveStt, false, false);
        stats.record(DataSource::LiveStt, true, false);
        stats.record(DataSource::LiveStt, false, true);

        let s = stats.snapshot();
        assert_eq!(s.total, 4);
        assert_eq!(s.historical, 1);
        assert_eq!(s.live, 3);
        assert_eq!(s.overrides, 1);
        assert_eq!(s.ambiguous, 1);
        assert_eq!(s.unknown, 0);
    }
}
