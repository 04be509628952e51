//! # Live STT Client
//! Opaque transcription upstream for sessions the historical API has not yet
//! archived. Invoked through the same `RecordSource` contract as the NDL
//! client, so the collector never branches on which source it is driving.
//!
//! Single-page semantics: one transcription call returns all speech segments
//! for the requested session; there is no continuation cursor.

use std::time::Duration;

use serde::Serialize;

use crate::error::IngestError;
use crate::source::{check_status, CollectQuery, RawPage, RecordSource};

pub struct LiveSttClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    session: Option<u32>,
    meeting_id: Option<&'a str>,
    date: Option<String>,
}

impl LiveSttClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl RecordSource for LiveSttClient {
    async fn fetch_page(&self, query: &CollectQuery, _cursor: u64) -> Result<RawPage, IngestError> {
        let req = TranscribeRequest {
            session: query.session,
            meeting_id: query.meeting_id.as_deref(),
            date: query.from.map(|d| d.format("%Y-%m-%d").to_string()),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| IngestError::from_transport(&e))?;

        let resp = check_status(resp).await?;

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IngestError::from_transport(&e))?;

        // The STT payload carries speech segments (text, language, duration);
        // they are normalized through the same path as archived speeches.
        let records = body
            .get("speechRecord")
            .or_else(|| body.get("segments"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        tracing::debug!(returned = records.len(), "live stt transcription fetched");

        Ok(RawPage {
            records,
            number_of_records: None,
            next_cursor: None,
        })
    }

    fn name(&self) -> &'static str {
        "live_stt"
    }
}
