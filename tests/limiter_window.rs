// tests/limiter_window.rs
// Sliding-window admission under paused tokio time: sleeps advance the clock
// instantly, so wall-clock assertions are exact virtual durations.

use std::sync::Arc;

use kokkai_ingest::RateLimiter;
use tokio::time::{Duration, Instant};

#[tokio::test(start_paused = true)]
async fn two_n_acquires_span_at_least_one_window() {
    let n = 3;
    let window = Duration::from_secs(2);
    let limiter = RateLimiter::new(n, window);

    let t0 = Instant::now();
    for _ in 0..(2 * n) {
        limiter.acquire().await;
    }
    assert!(
        t0.elapsed() >= window,
        "2N sequential acquires finished in {:?}",
        t0.elapsed()
    );
}

#[tokio::test(start_paused = true)]
async fn window_slides_rather_than_resets() {
    let limiter = RateLimiter::new(2, Duration::from_secs(10));

    limiter.acquire().await; // t=0
    tokio::time::sleep(Duration::from_secs(6)).await;
    limiter.acquire().await; // t=6

    // Third acquire must wait for the t=0 grant to age out at t=10,
    // not for a full fresh window.
    let t0 = Instant::now();
    limiter.acquire().await;
    let waited = t0.elapsed();
    assert!(waited >= Duration::from_secs(4), "waited {waited:?}");
    assert!(waited < Duration::from_secs(10), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn aborted_waiter_leaves_bookkeeping_intact() {
    let limiter = Arc::new(RateLimiter::new(2, Duration::from_secs(10)));

    limiter.acquire().await; // t=0
    limiter.acquire().await; // t=0, window now full

    // A third acquire must wait until t=10; cancel it mid-wait.
    let waiter = {
        let limiter = limiter.clone();
        tokio::spawn(async move { limiter.acquire().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await; // let it reach its sleep
    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());

    // The cancelled waiter was never admitted and never recorded.
    assert_eq!(limiter.in_flight().await, 2);

    // The next acquire is admitted exactly when the t=0 grants age out,
    // not one window after the cancellation.
    let t0 = Instant::now();
    limiter.acquire().await;
    let waited = t0.elapsed();
    assert!(waited >= Duration::from_secs(8), "waited {waited:?}");
    assert!(waited < Duration::from_secs(10), "waited {waited:?}");
    assert_eq!(limiter.in_flight().await, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_contenders_never_exceed_the_limit() {
    let n = 4;
    let window = Duration::from_secs(5);
    let limiter = Arc::new(RateLimiter::new(n, window));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            Instant::now()
        }));
    }

    let mut grants = Vec::new();
    for h in handles {
        grants.push(h.await.unwrap());
    }
    grants.sort();

    // Any N+1 consecutive grants must span at least the window.
    for pair in grants.windows(n + 1) {
        let span = pair[n].duration_since(pair[0]);
        assert!(span >= window, "{n} grants within {span:?}");
    }
}
