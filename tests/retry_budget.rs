// tests/retry_budget.rs
// Retry discipline: transient failures consume the attempt budget, rate-limit
// waits do not, terminal failures are never retried. Paused tokio time keeps
// backoff sleeps instant.

use std::sync::atomic::{AtomicU32, Ordering};

use kokkai_ingest::{IngestError, RetryExecutor, RetryPolicy};
use tokio::time::{Duration, Instant};

fn executor() -> RetryExecutor {
    RetryExecutor::new(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(5),
        default_retry_after: Duration::from_secs(7),
    })
}

fn transient() -> IngestError {
    IngestError::Transient {
        status: Some(503),
        message: "unavailable".into(),
    }
}

#[tokio::test(start_paused = true)]
async fn two_transients_then_success_returns_value() {
    let calls = AtomicU32::new(0);
    let result = executor()
        .run("op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 42);
    // Two retries: three invocations total.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn budget_exhaustion_surfaces_last_error() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = executor()
        .run("op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

    assert!(matches!(result, Err(IngestError::Transient { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn terminal_400_is_never_retried() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = executor()
        .run("op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(IngestError::Terminal {
                    status: 400,
                    message: "bad request".into(),
                })
            }
        })
        .await;

    assert!(matches!(result, Err(IngestError::Terminal { status: 400, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_waits_do_not_consume_the_budget() {
    // Five 429s, then two transients, then success: succeeds only if the
    // 429s were uncounted (budget is 3).
    let calls = AtomicU32::new(0);
    let result = executor()
        .run("op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0..=4 => Err(IngestError::RateLimited {
                        retry_after: Some(Duration::from_secs(1)),
                    }),
                    5 | 6 => Err(transient()),
                    _ => Ok("done"),
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_honors_server_provided_delay() {
    let calls = AtomicU32::new(0);
    let t0 = Instant::now();
    let result = executor()
        .run("op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(IngestError::RateLimited {
                        retry_after: Some(Duration::from_secs(30)),
                    })
                } else {
                    Ok(())
                }
            }
        })
        .await;

    result.unwrap();
    assert!(t0.elapsed() >= Duration::from_secs(30));
}
