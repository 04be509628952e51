//! # Ingestion Request
//! One unit of ingestion work. Only the fields needed to route are populated;
//! a request with no date, session, or override falls through to the router's
//! default source. Immutable once created.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::source::DataSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRequest {
    pub meeting_date: Option<NaiveDate>,
    pub meeting_id: Option<String>,
    pub diet_session: Option<u32>,
    /// Explicit operator override; wins over every other field.
    pub force_source: Option<DataSource>,
    /// Free-form hint; not scheduling-significant.
    pub priority: Option<String>,
}

impl IngestionRequest {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            meeting_date: Some(date),
            ..Default::default()
        }
    }

    pub fn for_session(session: u32) -> Self {
        Self {
            diet_session: Some(session),
            ..Default::default()
        }
    }

    pub fn for_meeting(id: impl Into<String>) -> Self {
        Self {
            meeting_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn forced(mut self, source: DataSource) -> Self {
        self.force_source = Some(source);
        self
    }

    /// A short identifier for operator-facing failure reports.
    pub fn describe(&self) -> String {
        if let Some(id) = &self.meeting_id {
            return format!("meeting:{id}");
        }
        if let Some(d) = self.meeting_date {
            return format!("date:{d}");
        }
        if let Some(s) = self.diet_session {
            return format!("session:{s}");
        }
        "unconstrained".to_string()
    }
}
