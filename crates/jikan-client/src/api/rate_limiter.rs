//! Sliding-window rate limiter.
//!
//! Enforces both a minimum spacing between requests (per-second limit) and
//! a cap on requests inside any rolling minute. Jikan allows 3/s and 60/min.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Rate limiter with dual constraints (per-second and per-minute)
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between two requests
    min_interval: Duration,
    /// Maximum requests per rolling minute
    max_per_minute: usize,
    /// Request timestamps inside the current window, oldest first
    recent: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(max_per_second: f64, max_per_minute: u32) -> Self {
        let min_interval = if max_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / max_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            min_interval,
            max_per_minute: max_per_minute.max(1) as usize,
            recent: VecDeque::with_capacity(max_per_minute as usize),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.recent.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Earliest instant at which the next request may go out
    fn next_slot(&self, now: Instant) -> Instant {
        let mut slot = now;

        if let Some(&last) = self.recent.back() {
            slot = slot.max(last + self.min_interval);
        }

        if self.recent.len() >= self.max_per_minute {
            let idx = self.recent.len() - self.max_per_minute;
            slot = slot.max(self.recent[idx] + WINDOW);
        }

        slot
    }

    /// Wait until a request can be made, then record it
    pub async fn acquire(&mut self) {
        let now = Instant::now();
        self.prune(now);

        let slot = self.next_slot(now);
        if slot > now {
            tracing::debug!(
                wait_ms = (slot - now).as_millis() as u64,
                in_window = self.recent.len(),
                "Rate limit: waiting for slot"
            );
            sleep_until(slot).await;
        }

        let request_time = Instant::now();
        self.prune(request_time);
        self.recent.push_back(request_time);
    }

    /// Number of requests made in the last minute
    pub fn current_minute_count(&mut self) -> usize {
        self.prune(Instant::now());
        self.recent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_per_second() {
        let mut limiter = RateLimiter::new(2.0, 50);

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }

        // Three requests at 2/s need two full intervals
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_per_minute() {
        let mut limiter = RateLimiter::new(100.0, 3);

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expires() {
        let mut limiter = RateLimiter::new(10.0, 5);
        for _ in 0..4 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.current_minute_count(), 4);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.current_minute_count(), 0);
    }
}
