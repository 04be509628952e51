//! # NDL Minutes API Client
//! Historical upstream: HTTP GET with date/session/house/committee query
//! parameters, cursor pagination via `startRecord` + `maximumRecords`
//! (upstream caps page size at 100), JSON responses carrying
//! `numberOfRecords` and a `meetingRecord` array.

use std::time::Duration;

use crate::error::IngestError;
use crate::source::{check_status, CollectQuery, RawPage, RecordSource};

pub const DEFAULT_BASE_URL: &str = "https://kokkai.ndl.go.jp/api/meeting";

/// Upstream cap on `maximumRecords`.
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct NdlMinutesClient {
    base_url: String,
    client: reqwest::Client,
    page_size: u32,
}

impl NdlMinutesClient {
    pub fn new(base_url: impl Into<String>, page_size: u32, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    fn build_params(&self, query: &CollectQuery, cursor: u64) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = vec![
            ("recordPacking", "json".into()),
            ("startRecord", cursor.max(1).to_string()),
            ("maximumRecords", self.page_size.to_string()),
        ];
        if let Some(from) = query.from {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(until) = query.until {
            params.push(("until", until.format("%Y-%m-%d").to_string()));
        }
        if let Some(session) = query.session {
            params.push(("sessionFrom", session.to_string()));
            params.push(("sessionTo", session.to_string()));
        }
        if let Some(house) = &query.house {
            params.push(("nameOfHouse", house.clone()));
        }
        if let Some(committee) = &query.committee {
            params.push(("nameOfMeeting", committee.clone()));
        }
        if let Some(id) = &query.meeting_id {
            params.push(("issueID", id.clone()));
        }
        params
    }
}

#[async_trait::async_trait]
impl RecordSource for NdlMinutesClient {
    async fn fetch_page(&self, query: &CollectQuery, cursor: u64) -> Result<RawPage, IngestError> {
        let params = self.build_params(query, cursor);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| IngestError::from_transport(&e))?;

        let resp = check_status(resp).await?;

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IngestError::from_transport(&e))?;

        let records = body
            .get("meetingRecord")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let number_of_records = body
            .get("numberOfRecords")
            .and_then(|v| v.as_u64())
            .and_then(|n| u32::try_from(n).ok());

        // `nextRecordPosition` is null on the last page; an empty page also
        // terminates even if the upstream still advertises a position.
        let next_cursor = if records.is_empty() {
            None
        } else {
            body.get("nextRecordPosition").and_then(|v| v.as_u64())
        };

        tracing::debug!(
            start_record = cursor,
            returned = records.len(),
            total = number_of_records,
            "ndl minutes page fetched"
        );

        Ok(RawPage {
            records,
            number_of_records,
            next_cursor,
        })
    }

    fn name(&self) -> &'static str {
        "ndl_minutes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn params_cover_query_fields_and_cursor() {
        let c = NdlMinutesClient::new("http://x", 100, Duration::from_secs(30)).unwrap();
        let q = CollectQuery {
            from: NaiveDate::from_ymd_opt(2025, 3, 1),
            until: NaiveDate::from_ymd_opt(2025, 3, 31),
            session: Some(217),
            house: Some("衆議院".into()),
            ..Default::default()
        };
        let params = c.build_params(&q, 101);
        let get = |k: &str| params.iter().find(|(pk, _)| *pk == k).map(|(_, v)| v.as_str());
        assert_eq!(get("startRecord"), Some("101"));
        assert_eq!(get("maximumRecords"), Some("100"));
        assert_eq!(get("from"), Some("2025-03-01"));
        assert_eq!(get("sessionFrom"), Some("217"));
        assert_eq!(get("sessionTo"), Some("217"));
        assert_eq!(get("nameOfHouse"), Some("衆議院"));
    }

    #[test]
    fn page_size_is_capped_at_upstream_limit() {
        let c = NdlMinutesClient::new("http://x", 500, Duration::from_secs(30)).unwrap();
        let params = c.build_params(&CollectQuery::default(), 1);
        let max = params
            .iter()
            .find(|(k, _)| *k == "maximumRecords")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(max, "100");
    }
}
