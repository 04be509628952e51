// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod collector;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod limiter;
pub mod records;
pub mod request;
pub mod retry;
pub mod router;
pub mod source;
pub mod sources;
pub mod stats;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::collector::PaginatedCollector;
pub use crate::config::{IngestConfig, RoutingPolicy};
pub use crate::coordinator::{BatchOutcome, BatchSummary, IngestionCoordinator};
pub use crate::error::IngestError;
pub use crate::limiter::RateLimiter;
pub use crate::records::{Meeting, NormalizedRecord, Speech};
pub use crate::request::IngestionRequest;
pub use crate::retry::{RetryExecutor, RetryPolicy};
pub use crate::router::{HybridRouter, RoutingDecision};
pub use crate::source::{CollectQuery, DataSource, RawPage, RecordSource};
pub use crate::stats::{RoutingStatistics, StatsSnapshot};
pub use crate::store::RecordStore;

use std::collections::HashMap;
use std::sync::Arc;

/// Wire a coordinator from configuration: one rate limiter per source, both
/// upstream clients behind their collectors, and a router with fresh
/// statistics. The binary and most callers start here.
pub fn build_coordinator(cfg: &IngestConfig) -> anyhow::Result<IngestionCoordinator> {
    let stats = Arc::new(RoutingStatistics::new());
    let router = HybridRouter::new(cfg.routing, stats);

    let retry = RetryExecutor::new(cfg.retry.policy());
    let timeout = cfg.collector.request_timeout();

    let historical: Arc<dyn RecordSource> = Arc::new(sources::historical::NdlMinutesClient::new(
        cfg.sources.historical_base_url.clone(),
        cfg.collector.page_size,
        timeout,
    )?);
    let live: Arc<dyn RecordSource> = Arc::new(sources::live_stt::LiveSttClient::new(
        cfg.sources.live_stt_endpoint.clone(),
        timeout,
    )?);

    // One limiter instance per upstream source, never shared across sources.
    let mut collectors: HashMap<DataSource, Arc<PaginatedCollector>> = HashMap::new();
    for (source, client) in [
        (DataSource::HistoricalApi, historical),
        (DataSource::LiveStt, live),
    ] {
        let limiter = Arc::new(RateLimiter::new(
            cfg.rate_limit.max_requests,
            cfg.rate_limit.window(),
        ));
        collectors.insert(
            source,
            Arc::new(PaginatedCollector::new(client, limiter, retry.clone())),
        );
    }

    Ok(IngestionCoordinator::new(
        router,
        collectors,
        cfg.collector.max_records_default,
    ))
}
