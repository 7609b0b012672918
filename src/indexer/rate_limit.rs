use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Caps outbound calls at `max_per_minute` over a rolling one-minute window.
/// Callers over the cap wait for the oldest call to age out.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_minute: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        Self::with_window(max_per_minute, WINDOW)
    }

    pub fn with_window(max_per_minute: usize, window: Duration) -> Self {
        Self {
            max_per_minute,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_per_minute)),
        }
    }

    /// Wait until a call is allowed, then record it. A limit of zero disables
    /// limiting.
    pub async fn acquire(&self) {
        if self.max_per_minute == 0 {
            return;
        }

        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    calls.pop_front();
                }

                if calls.len() < self.max_per_minute {
                    calls.push_back(now);
                    return;
                }

                match calls.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_under_limit_does_not_wait() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_over_limit_waits_for_window() {
        let limiter = RateLimiter::with_window(2, Duration::from_millis(100));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_disables() {
        let limiter = RateLimiter::new(0);
        for _ in 0..100 {
            limiter.acquire().await;
        }
    }
}
