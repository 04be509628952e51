// tests/router_stats.rs
// Statistics accounting: per-source counters reflect the resulting decision,
// overrides and ambiguous defaults are tracked separately.

use std::sync::Arc;

use chrono::NaiveDate;
use kokkai_ingest::{DataSource, HybridRouter, IngestionRequest, RoutingPolicy, RoutingStatistics};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn per_source_and_override_counters() {
    let stats = Arc::new(RoutingStatistics::new());
    let router = HybridRouter::new(RoutingPolicy::default(), stats.clone());

    // N1 = 2 historical by date.
    router.route(&IngestionRequest::for_date(d(2025, 3, 1)));
    router.route(&IngestionRequest::for_date(d(2024, 11, 5)));

    // N2 = 3 live by date/session.
    router.route(&IngestionRequest::for_date(d(2025, 7, 1)));
    router.route(&IngestionRequest::for_date(d(2025, 8, 1)));
    router.route(&IngestionRequest::for_session(220));

    // N3 = 2 overridden to live: counted in the live bucket AND overrides.
    router.route(&IngestionRequest::for_date(d(2020, 1, 1)).forced(DataSource::LiveStt));
    router.route(&IngestionRequest::default().forced(DataSource::LiveStt));

    let s = stats.snapshot();
    assert_eq!(s.total, 7);
    assert_eq!(s.historical, 2);
    assert_eq!(s.live, 3 + 2);
    assert_eq!(s.overrides, 2);
    assert_eq!(s.unknown, 0);
}

#[test]
fn ambiguous_counter_tracks_only_unconstrained_requests() {
    let stats = Arc::new(RoutingStatistics::new());
    let router = HybridRouter::new(RoutingPolicy::default(), stats.clone());

    router.route(&IngestionRequest::default());
    router.route(&IngestionRequest::default());
    router.route(&IngestionRequest::for_date(d(2025, 3, 1)));
    // Overriding an otherwise-ambiguous request counts as an override, not
    // as an ambiguous default.
    router.route(&IngestionRequest::default().forced(DataSource::HistoricalApi));

    let s = stats.snapshot();
    assert_eq!(s.ambiguous, 2);
    assert_eq!(s.overrides, 1);
    assert_eq!(s.total, 4);
}

#[test]
fn concurrent_routing_never_drops_increments() {
    let stats = Arc::new(RoutingStatistics::new());
    let router = Arc::new(HybridRouter::new(RoutingPolicy::default(), stats.clone()));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let router = router.clone();
            scope.spawn(move || {
                for _ in 0..1000 {
                    router.route(&IngestionRequest::for_session(217));
                }
            });
        }
    });

    let s = stats.snapshot();
    assert_eq!(s.total, 8000);
    assert_eq!(s.historical, 8000);
}
