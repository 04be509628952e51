//! # Retry Executor
//! Bounded exponential backoff around a single upstream call.
//!
//! Explicit attempt loop over classified outcomes rather than recursion:
//! rate-limit waits honor the server-provided delay and do not consume the
//! attempt budget; transient failures back off `base_delay * 2^(attempt-1)`
//! capped at `max_delay` and count against the budget; terminal failures
//! propagate immediately.

use std::future::Future;

use tokio::time::{sleep, Duration};

use crate::error::IngestError;

/// Backoff parameters, loaded from [`crate::config::RetryCfg`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Wait used on 429 when the upstream did not provide `Retry-After`.
    pub default_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            default_retry_after: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Invoke `op` until it succeeds, the attempt budget is exhausted, or a
    /// terminal failure occurs. `op_name` labels log lines and metrics.
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, IngestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, IngestError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match err {
                IngestError::RateLimited { retry_after } => {
                    // Not counted against the budget.
                    let wait = retry_after.unwrap_or(self.policy.default_retry_after);
                    metrics::counter!("ingest_rate_limited_total").increment(1);
                    tracing::warn!(
                        op = op_name,
                        attempt,
                        wait_secs = wait.as_secs(),
                        "upstream rate limited; waiting"
                    );
                    sleep(wait).await;
                }
                IngestError::Transient { status, message } => {
                    if attempt >= self.policy.max_attempts {
                        tracing::error!(
                            op = op_name,
                            attempt,
                            status,
                            error = %message,
                            "retry budget exhausted"
                        );
                        return Err(IngestError::Transient { status, message });
                    }
                    let backoff = self.backoff_delay(attempt);
                    metrics::counter!("ingest_retries_total").increment(1);
                    tracing::warn!(
                        op = op_name,
                        attempt,
                        status,
                        error = %message,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient failure; retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                terminal => {
                    tracing::error!(
                        op = op_name,
                        attempt,
                        status = terminal.status(),
                        error = %terminal,
                        "terminal failure; not retrying"
                    );
                    return Err(terminal);
                }
            }
        }
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.policy.base_delay.saturating_mul(1u32 << exp);
        delay.min(self.policy.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let exec = RetryExecutor::new(RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
            default_retry_after: Duration::from_secs(5),
        });
        assert_eq!(exec.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(exec.backoff_delay(2), Duration::from_secs(1));
        assert_eq!(exec.backoff_delay(3), Duration::from_secs(2));
        assert_eq!(exec.backoff_delay(4), Duration::from_secs(2)); // capped
    }
}
