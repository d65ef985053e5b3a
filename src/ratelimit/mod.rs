//! Per-caller sliding-window rate limiter
//!
//! Process-local, best-effort limiting over a keyed map of request
//! timestamps. Each check locks only its own key's entry (DashMap shard
//! locking), so the read-filter-append sequence is atomic per key and the
//! window structure cannot be corrupted by concurrent requests.
//!
//! Multi-instance deployments need an external store instead; this limiter
//! deliberately stays in-process.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Returned when a caller exhausts its window.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("too many requests; wait for the window to pass and try again")]
pub struct RateLimitExceeded;

/// Sliding-window limiter keyed by caller identity.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    requests: DashMap<String, Vec<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            requests: DashMap::new(),
        }
    }

    /// Admit or reject one request for `key`.
    ///
    /// Expired timestamps are pruned, then the request is appended only if
    /// the window has room. The nth+1 request inside a full window is
    /// rejected without side effects.
    pub fn check(&self, key: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(key, Instant::now())
    }

    /// Testable variant taking an explicit clock reading.
    fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        let mut entry = self.requests.entry(key.to_string()).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);
        if entry.len() >= self.max_requests {
            return Err(RateLimitExceeded);
        }
        entry.push(now);
        Ok(())
    }

    /// Number of live (unexpired) requests recorded for `key`.
    pub fn in_flight(&self, key: &str) -> usize {
        let now = Instant::now();
        self.requests
            .get(key)
            .map(|e| e.iter().filter(|&&t| now.duration_since(t) < self.window).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(60));
        for _ in 0..10 {
            assert!(limiter.check("global").is_ok());
        }
    }

    #[test]
    fn test_rejects_eleventh_request() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(60));
        for _ in 0..10 {
            limiter.check("global").unwrap();
        }
        assert_eq!(limiter.check("global"), Err(RateLimitExceeded));
        // Rejection leaves the window untouched.
        assert_eq!(limiter.in_flight("global"), 10);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("alice").is_ok());
        assert!(limiter.check("bob").is_ok());
        assert_eq!(limiter.check("alice"), Err(RateLimitExceeded));
    }

    #[test]
    fn test_admits_after_window_closes() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_millis(50));
        let start = Instant::now();
        limiter.check_at("global", start).unwrap();
        assert_eq!(
            limiter.check_at("global", start + Duration::from_millis(10)),
            Err(RateLimitExceeded)
        );
        // First request past the window boundary succeeds again.
        assert!(limiter
            .check_at("global", start + Duration::from_millis(60))
            .is_ok());
    }

    #[test]
    fn test_concurrent_checks_do_not_corrupt_window() {
        use std::sync::Arc;
        let limiter = Arc::new(SlidingWindowLimiter::new(100, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let _ = limiter.check("shared");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Exactly max_requests admitted across all threads.
        assert_eq!(limiter.in_flight("shared"), 100);
    }
}
