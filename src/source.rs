//! # Upstream Seam
//! `DataSource` names the upstream a decision routes to; `RecordSource` is the
//! uniform fetch contract both upstreams implement, so the collector and the
//! router's output stay source-agnostic at the call site.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Which upstream services a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// NDL Minutes API: archived sessions, paginated, rate limited.
    HistoricalApi,
    /// Live speech-to-text pipeline for sessions not yet archived.
    LiveStt,
    Unknown,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DataSource::HistoricalApi => "historical_api",
            DataSource::LiveStt => "live_stt",
            DataSource::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// What to fetch. Built by the coordinator from an `IngestionRequest`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectQuery {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub session: Option<u32>,
    pub house: Option<String>,
    pub committee: Option<String>,
    pub meeting_id: Option<String>,
}

/// One page of raw upstream records plus the continuation cursor, if any.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub records: Vec<serde_json::Value>,
    /// Total the upstream reports for the query, when it reports one.
    pub number_of_records: Option<u32>,
    /// Opaque cursor for the next page; `None` means end-of-data.
    pub next_cursor: Option<u64>,
}

/// Uniform upstream fetch contract. Implemented by the NDL Minutes client and
/// the live STT client; test fakes implement it in-memory.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page for `query` starting at `cursor` (1-based record
    /// offset for the historical API; ignored by single-page sources).
    async fn fetch_page(&self, query: &CollectQuery, cursor: u64) -> Result<RawPage, IngestError>;

    fn name(&self) -> &'static str;
}

/// Parse a `Retry-After` value in its seconds form. The HTTP-date form is
/// ignored; the retry executor then falls back to its default wait.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn retry_after(resp: &reqwest::Response) -> Option<Duration> {
    parse_retry_after(
        resp.headers()
            .get(reqwest::header::RETRY_AFTER)?
            .to_str()
            .ok()?,
    )
}

/// Shared status handling for both HTTP upstreams: 429 becomes `RateLimited`
/// carrying the server-provided wait, any other non-2xx classifies by code
/// with the response body as the message.
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, IngestError> {
    let status = resp.status();
    if status.as_u16() == 429 {
        return Err(IngestError::RateLimited {
            retry_after: retry_after(&resp),
        });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(IngestError::from_status(status.as_u16(), body));
    }
    Ok(resp)
}
