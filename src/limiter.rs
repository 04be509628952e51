//! # Rate Limiter
//! Sliding-window admission: at most `max_requests` grants within any trailing
//! `window`. One instance per upstream source; all tasks hitting that source
//! share it.
//!
//! `acquire()` only suspends, never fails. The grant timestamp is recorded in
//! the same critical section as the admission check, so a task cancelled while
//! waiting has consumed nothing and a task past admission has always been
//! recorded.

use std::collections::VecDeque;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            granted: Mutex::new(VecDeque::new()),
        }
    }

    /// Block until one more request may be issued, then record the grant.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut granted = self.granted.lock().await;
                let now = Instant::now();

                // Prune grants older than the trailing window.
                while let Some(&front) = granted.front() {
                    if now.duration_since(front) >= self.window {
                        granted.pop_front();
                    } else {
                        break;
                    }
                }

                if granted.len() < self.max_requests {
                    granted.push_back(now);
                    return;
                }

                // Window is full: wait until the oldest grant ages out, then
                // re-check under the lock. Several waiters may unblock at the
                // same instant; the re-check keeps grants at max_requests.
                let oldest = *granted.front().expect("window full but empty queue");
                self.window - now.duration_since(oldest)
            };

            metrics::counter!("ingest_rate_limit_waits_total").increment(1);
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limiter window full");
            sleep(wait).await;
        }
    }

    /// Grants currently inside the window (diagnostics only).
    pub async fn in_flight(&self) -> usize {
        let granted = self.granted.lock().await;
        let now = Instant::now();
        granted
            .iter()
            .filter(|&&t| now.duration_since(t) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn grants_up_to_limit_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let t0 = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(t0.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_flight().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_acquire_waits_for_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        for _ in 0..3 {
            limiter.acquire().await;
        }
        let t0 = Instant::now();
        limiter.acquire().await;
        assert!(t0.elapsed() >= Duration::from_secs(10));
    }
}
