//! # Normalized Records
//! Typed domain records parsed from raw upstream JSON.
//!
//! Invariant: every record reaching the caller has a non-empty id. A record
//! missing its identifier is dropped with a logged warning, never propagated
//! as a half-built object.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// One meeting of a house or committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub session: Option<u32>,
    pub house: Option<String>,
    pub committee: Option<String>,
    pub document_url: Option<String>,
}

/// One speech within a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speech {
    pub id: String,
    pub meeting_id: String,
    pub speaker_name: String,
    pub speaker_group: Option<String>,
    /// Speech kind as reported by the upstream (question, answer, ...).
    pub kind: Option<String>,
    pub order: u32,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Typed output of the collector, source-agnostic at the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizedRecord {
    Meeting(Meeting),
    Speech(Speech),
}

impl NormalizedRecord {
    /// Stable upstream identifier used for idempotent upsert downstream.
    pub fn natural_key(&self) -> &str {
        match self {
            NormalizedRecord::Meeting(m) => &m.id,
            NormalizedRecord::Speech(s) => &s.id,
        }
    }
}

fn str_field(v: &serde_json::Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn u32_field(v: &serde_json::Value, key: &str) -> Option<u32> {
    v.get(key).and_then(|x| {
        x.as_u64()
            .or_else(|| x.as_str().and_then(|s| s.parse().ok()))
            .and_then(|n| u32::try_from(n).ok())
    })
}

/// Parse one raw meeting record. Fails (for skip-with-warning handling in the
/// collector) when the id is missing or empty.
pub fn parse_meeting(raw: &serde_json::Value) -> Result<Meeting, IngestError> {
    let id = str_field(raw, "issueID")
        .ok_or_else(|| IngestError::Parse("meeting record without issueID".into()))?;

    let date = str_field(raw, "date").and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());

    // "予算委員会 第3号" style title when the upstream reports an issue number.
    let name = str_field(raw, "nameOfMeeting").unwrap_or_default();
    let title = match str_field(raw, "issue") {
        Some(issue) => format!("{name} {issue}"),
        None => name.clone(),
    };

    Ok(Meeting {
        id,
        title,
        date,
        session: u32_field(raw, "session"),
        house: str_field(raw, "nameOfHouse"),
        committee: Some(name).filter(|s| !s.is_empty()),
        document_url: str_field(raw, "meetingURL"),
    })
}

/// Parse one raw speech record. `meeting_id` comes from the enclosing meeting
/// when the upstream nests speeches; standalone speech records carry their own.
pub fn parse_speech(raw: &serde_json::Value, meeting_id: Option<&str>) -> Result<Speech, IngestError> {
    let id = str_field(raw, "speechID")
        .ok_or_else(|| IngestError::Parse("speech record without speechID".into()))?;

    let meeting_id = str_field(raw, "issueID")
        .or_else(|| meeting_id.map(str::to_string))
        .unwrap_or_default();

    let timestamp = str_field(raw, "date")
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Speech {
        id,
        meeting_id,
        speaker_name: str_field(raw, "speaker").unwrap_or_default(),
        speaker_group: str_field(raw, "speakerGroup"),
        kind: str_field(raw, "speechType"),
        order: u32_field(raw, "speechOrder").unwrap_or(0),
        content: str_field(raw, "speech").unwrap_or_default(),
        timestamp,
    })
}

/// Normalize one raw upstream value into typed records.
///
/// A value carrying `speechID` is a standalone speech; otherwise it is a
/// meeting, and any nested `speechRecord` array is expanded alongside it.
/// Nested speeches missing their id are skipped with a warning; only a
/// missing top-level id fails the whole value.
pub fn normalize_raw(raw: &serde_json::Value) -> Result<Vec<NormalizedRecord>, IngestError> {
    if raw.get("speechID").is_some() {
        return Ok(vec![NormalizedRecord::Speech(parse_speech(raw, None)?)]);
    }

    let meeting = parse_meeting(raw)?;
    let mut out = Vec::with_capacity(1);

    if let Some(speeches) = raw.get("speechRecord").and_then(|v| v.as_array()) {
        out.reserve(speeches.len());
        for sp in speeches {
            match parse_speech(sp, Some(&meeting.id)) {
                Ok(s) => out.push(NormalizedRecord::Speech(s)),
                Err(e) => {
                    metrics::counter!("ingest_parse_failures_total").increment(1);
                    tracing::warn!(meeting_id = %meeting.id, error = %e, "dropping nested speech");
                }
            }
        }
    }

    out.insert(0, NormalizedRecord::Meeting(meeting));
    Ok(out)
}
