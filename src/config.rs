//! # Configuration
//! Everything operational is external: cutoff date, session brackets, rate
//! limit, retry budget, page size, timeouts. Rolling the cutoff forward is a
//! config change, never a redeploy.
//!
//! Load order: `$KOKKAI_INGEST_CONFIG` → `config/ingest.toml` →
//! `config/ingest.json` → built-in defaults. TOML and JSON both accepted.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const ENV_CONFIG_PATH: &str = "KOKKAI_INGEST_CONFIG";

/// The router's entire policy surface: one cutoff date, the current-session
/// bracket, and the last session number the historical API fully covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingPolicy {
    /// Last day the historical API is known to have complete data.
    pub cutoff_date: NaiveDate,
    /// First day of the current legislative session.
    pub session_start: NaiveDate,
    /// Last day of the current legislative session.
    pub session_end: NaiveDate,
    /// Sessions up to and including this number route to the historical API.
    pub historical_session_boundary: u32,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        // 217th ordinary session, closed 2025-06-21.
        Self {
            cutoff_date: date(2025, 6, 21),
            session_start: date(2025, 1, 24),
            session_end: date(2025, 6, 21),
            historical_session_boundary: 217,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateLimitCfg {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Default for RateLimitCfg {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window_secs: 1,
        }
    }
}

impl RateLimitCfg {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryCfg {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub default_retry_after_secs: u64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            default_retry_after_secs: 5,
        }
    }
}

impl RetryCfg {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            default_retry_after: Duration::from_secs(self.default_retry_after_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorCfg {
    pub page_size: u32,
    pub request_timeout_secs: u64,
    /// Record cap applied when the caller does not supply one.
    pub max_records_default: usize,
}

impl Default for CollectorCfg {
    fn default() -> Self {
        Self {
            page_size: 100,
            request_timeout_secs: 30,
            max_records_default: 10_000,
        }
    }
}

impl CollectorCfg {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesCfg {
    pub historical_base_url: String,
    pub live_stt_endpoint: String,
}

impl Default for SourcesCfg {
    fn default() -> Self {
        Self {
            historical_base_url: crate::sources::historical::DEFAULT_BASE_URL.to_string(),
            live_stt_endpoint: "http://localhost:8900/transcribe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub routing: RoutingPolicy,
    pub rate_limit: RateLimitCfg,
    pub retry: RetryCfg,
    pub collector: CollectorCfg,
    pub sources: SourcesCfg,
}

impl IngestConfig {
    /// Load from an explicit path. Format is chosen by extension, with a
    /// content-sniffing fallback so either format works from any path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading ingest config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, &ext)
    }

    /// Load using env var + fallbacks:
    /// 1) $KOKKAI_INGEST_CONFIG
    /// 2) config/ingest.toml
    /// 3) config/ingest.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("KOKKAI_INGEST_CONFIG points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/ingest.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/ingest.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<IngestConfig> {
    let try_toml = hint_ext == "toml" || !s.trim_start().starts_with('{');
    if try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported ingest config format"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid built-in date")
}
