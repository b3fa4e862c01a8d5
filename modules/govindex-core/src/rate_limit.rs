//! Sliding-window rate limiter for outbound calls.
//!
//! At most `calls` permits are granted in any window of length `per`.
//! `acquire` waits instead of failing. Waiters queue on a fair mutex, so they
//! are served in arrival order and none starves.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub struct RateLimiter {
    calls: usize,
    per: Duration,
    /// Grant times inside the current window, oldest first.
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// `calls` is clamped to at least one.
    pub fn new(calls: u32, per: Duration) -> Self {
        let calls = calls.max(1) as usize;
        Self {
            calls,
            per,
            granted: Mutex::new(VecDeque::with_capacity(calls)),
        }
    }

    pub fn per_second(calls: u32) -> Self {
        Self::new(calls, Duration::from_secs(1))
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn per(&self) -> Duration {
        self.per
    }

    /// Wait until a call may be issued, then record it.
    pub async fn acquire(&self) {
        let mut granted = self.granted.lock().await;

        loop {
            let now = Instant::now();
            while let Some(&oldest) = granted.front() {
                if now.duration_since(oldest) >= self.per {
                    granted.pop_front();
                } else {
                    break;
                }
            }

            if granted.len() < self.calls {
                granted.push_back(now);
                return;
            }

            // Full window: the oldest grant is the next to expire.
            if let Some(&oldest) = granted.front() {
                let ready_at = oldest + self.per;
                debug!(
                    wait_ms = ready_at.saturating_duration_since(now).as_millis() as u64,
                    "Rate limit reached, waiting"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn grants_up_to_limit_without_waiting() {
        let limiter = RateLimiter::per_second(10);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn eleventh_call_waits_for_the_window() {
        let limiter = RateLimiter::per_second(10);
        let start = Instant::now();
        for _ in 0..11 {
            limiter.acquire().await;
        }
        assert!(Instant::now() - start >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn hundred_calls_at_ten_per_second_take_nine_seconds() {
        let limiter = Arc::new(RateLimiter::per_second(10));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..100 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();

        assert!(Instant::now() - start >= Duration::from_secs(9));
        // No 11 grants inside any one-second window.
        for pair in stamps.windows(11) {
            assert!(pair[10] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resetting() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        let start = Instant::now();

        limiter.acquire().await;
        tokio::time::advance(Duration::from_millis(60)).await;
        limiter.acquire().await;

        // Third grant waits only until the first one ages out at t=100ms.
        limiter.acquire().await;
        assert_eq!(Instant::now() - start, Duration::from_millis(100));
    }

    #[test]
    fn zero_calls_is_clamped() {
        assert_eq!(RateLimiter::new(0, Duration::from_secs(1)).calls(), 1);
    }
}
