// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by client identifier.
//!
//! Each identifier gets one record holding an attempt count and the instant
//! its window closes. Denied requests are not counted, so a record never
//! holds more than `max_attempts`. Expired records are replaced on access
//! and reclaimed in bulk by [`RateLimiter::sweep`].
//!
//! State lives in this process only. Other instances of the service keep
//! their own counters, and a restart forgets every record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    /// Whether the attempt may proceed
    pub allowed: bool,
    /// When the current window closes and the counter resets
    pub reset_at: Instant,
    /// Admissions left in the current window
    pub attempts_left: u32,
}

impl RateLimitResult {
    /// Time until the window resets, zero if it already has.
    pub fn retry_after(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }

    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        ceil_secs(self.retry_after())
    }
}

/// Tracking state for one identifier.
#[derive(Debug)]
struct RateRecord {
    /// Admitted attempts in the current window
    attempts: u32,
    /// When the current window closes
    reset_at: Instant,
}

impl RateRecord {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            attempts: 1,
            reset_at: now + window,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }
}

/// Thread-safe rate limiter.
#[derive(Default)]
pub struct RateLimiter {
    records: Arc<RwLock<HashMap<String, RateRecord>>>,
}

impl RateLimiter {
    /// Create an empty rate limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt for `identifier` and decide whether it is admitted.
    ///
    /// `window` must be non-zero and `max_attempts` at least 1. Neither is
    /// checked here; callers pass values validated at configuration time.
    pub async fn check(
        &self,
        identifier: &str,
        window: Duration,
        max_attempts: u32,
    ) -> RateLimitResult {
        let now = Instant::now();
        let mut records = self.records.write().await;

        if let Some(record) = records.get_mut(identifier) {
            if !record.is_expired(now) {
                if record.attempts < max_attempts {
                    record.attempts += 1;
                    return RateLimitResult {
                        allowed: true,
                        reset_at: record.reset_at,
                        attempts_left: max_attempts - record.attempts,
                    };
                }

                debug!(identifier, attempts = record.attempts, "Rate limit exceeded");
                return RateLimitResult {
                    allowed: false,
                    reset_at: record.reset_at,
                    attempts_left: 0,
                };
            }
        }

        // New identifier, or its window has closed
        let record = RateRecord::new(now, window);
        let reset_at = record.reset_at;
        records.insert(identifier.to_string(), record);
        RateLimitResult {
            allowed: true,
            reset_at,
            attempts_left: max_attempts.saturating_sub(1),
        }
    }

    /// Remove every record whose window has closed. Returns how many were
    /// removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    /// Number of identifiers currently tracked.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no identifiers are tracked.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Render the time left until `reset_at` for a user-facing message.
pub fn format_wait_time(reset_at: Instant) -> String {
    format_wait_duration(reset_at.saturating_duration_since(Instant::now()))
}

/// Render a wait as "N seconds" below one minute, otherwise "M minutes".
/// Both units round up.
pub fn format_wait_duration(wait: Duration) -> String {
    let seconds = ceil_secs(wait);
    if seconds < 60 {
        plural(seconds, "second")
    } else {
        plural(seconds.div_ceil(60), "minute")
    }
}

fn ceil_secs(d: Duration) -> u64 {
    (d.as_millis() as u64).div_ceil(1000)
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_WINDOW: Duration = Duration::from_millis(120_000);

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_admitted() {
        let limiter = RateLimiter::new();

        let result = limiter.check("login_10.0.0.1", LOGIN_WINDOW, 5).await;
        assert!(result.allowed);
        assert_eq!(result.attempts_left, 4);
        assert_eq!(result.reset_at, Instant::now() + LOGIN_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_window() {
        let limiter = RateLimiter::new();
        let key = "login_1.2.3.4";

        let first = limiter.check(key, LOGIN_WINDOW, 1).await;
        assert!(first.allowed);
        assert_eq!(first.attempts_left, 0);

        let second = limiter.check(key, LOGIN_WINDOW, 1).await;
        assert!(!second.allowed);
        assert_eq!(second.attempts_left, 0);
        assert_eq!(second.reset_at, first.reset_at);

        tokio::time::advance(Duration::from_millis(120_001)).await;

        let third = limiter.check(key, LOGIN_WINDOW, 1).await;
        assert!(third.allowed);
        assert_eq!(third.attempts_left, 0);
        assert!(third.reset_at > first.reset_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_left_decreases() {
        let limiter = RateLimiter::new();

        let mut left = Vec::new();
        for _ in 0..4 {
            left.push(limiter.check("k", LOGIN_WINDOW, 4).await.attempts_left);
        }
        assert_eq!(left, vec![3, 2, 1, 0]);

        // Denials neither count nor go negative
        for _ in 0..3 {
            let result = limiter.check("k", LOGIN_WINDOW, 4).await;
            assert!(!result.allowed);
            assert_eq!(result.attempts_left, 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_boundary_resets() {
        let limiter = RateLimiter::new();
        limiter.check("k", LOGIN_WINDOW, 1).await;

        tokio::time::advance(LOGIN_WINDOW - Duration::from_millis(1)).await;
        assert!(!limiter.check("k", LOGIN_WINDOW, 1).await.allowed);

        // Expiry is inclusive of the reset instant
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(limiter.check("k", LOGIN_WINDOW, 1).await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identifiers_independent() {
        let limiter = RateLimiter::new();

        assert!(limiter.check("login_10.0.0.1", LOGIN_WINDOW, 1).await.allowed);
        assert!(!limiter.check("login_10.0.0.1", LOGIN_WINDOW, 1).await.allowed);
        assert!(limiter.check("login_10.0.0.2", LOGIN_WINDOW, 1).await.allowed);
        assert_eq!(limiter.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let limiter = RateLimiter::new();
        limiter.check("short", Duration::from_secs(10), 1).await;
        limiter.check("long", Duration::from_secs(600), 1).await;

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(limiter.len().await, 1);

        // The surviving record still counts against its window
        assert!(!limiter.check("long", Duration::from_secs(600), 1).await.allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_secs_rounds_up() {
        let limiter = RateLimiter::new();
        limiter.check("k", Duration::from_millis(1500), 1).await;
        let denied = limiter.check("k", Duration::from_millis(1500), 1).await;
        assert_eq!(denied.retry_after_secs(), 2);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(denied.retry_after(), Duration::ZERO);
        assert_eq!(denied.retry_after_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_format_wait_time() {
        let now = Instant::now();
        assert_eq!(format_wait_time(now + Duration::from_millis(30_000)), "30 seconds");
        assert_eq!(format_wait_time(now + Duration::from_millis(150_000)), "3 minutes");
        assert_eq!(format_wait_time(now + Duration::from_millis(120_000)), "2 minutes");

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(format_wait_time(now), "0 seconds");
    }

    #[test]
    fn test_format_wait_duration_units() {
        assert_eq!(format_wait_duration(Duration::ZERO), "0 seconds");
        assert_eq!(format_wait_duration(Duration::from_millis(1)), "1 second");
        assert_eq!(format_wait_duration(Duration::from_millis(59_001)), "1 minute");
        assert_eq!(format_wait_duration(Duration::from_secs(59)), "59 seconds");
        assert_eq!(format_wait_duration(Duration::from_secs(60)), "1 minute");
        assert_eq!(format_wait_duration(Duration::from_secs(61)), "2 minutes");
    }
}
