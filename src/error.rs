//! # Error Taxonomy
//! Classified upstream failures: what is retried, what waits, what is fatal.
//!
//! Classification drives the retry executor: `RateLimited` waits without
//! consuming budget, `Transient` retries with backoff, `Terminal` propagates
//! immediately. `Parse` never escalates past a single record.

use std::time::Duration;

/// Upstream/ingestion error, classified for retry handling.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Upstream signaled 429. Carries the server-provided wait, if any.
    #[error("rate limited by upstream")]
    RateLimited { retry_after: Option<Duration> },

    /// 5xx, timeout, connection reset. Worth retrying with backoff.
    #[error("transient upstream failure (HTTP {status:?}): {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// 4xx other than 429, malformed request. No retry will help.
    #[error("terminal upstream failure (HTTP {status}): {message}")]
    Terminal { status: u16, message: String },

    /// One record in a page failed to decode. Logged and skipped by the
    /// collector; never surfaced as a collection-level failure.
    #[error("record parse failure: {0}")]
    Parse(String),
}

impl IngestError {
    /// Classify an HTTP status code per the retry policy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            429 => IngestError::RateLimited { retry_after: None },
            s if s >= 500 => IngestError::Transient {
                status: Some(s),
                message: message.into(),
            },
            s => IngestError::Terminal {
                status: s,
                message: message.into(),
            },
        }
    }

    /// Transport-level failures (timeout, connect, broken body) are transient.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), err.to_string());
        }
        IngestError::Transient {
            status: None,
            message: err.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestError::RateLimited { .. } | IngestError::Transient { .. }
        )
    }

    /// Status code for logging, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            IngestError::RateLimited { .. } => Some(429),
            IngestError::Transient { status, .. } => *status,
            IngestError::Terminal { status, .. } => Some(*status),
            IngestError::Parse(_) => None,
        }
    }
}
