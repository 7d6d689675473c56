//! Fixed-window rate limiting keyed by client.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Raised when a key exhausts its window allowance.
#[derive(Debug, Error)]
#[error("rate limit exceeded for {key}, retry in {retry_after_secs}s")]
pub struct RateLimitExceeded {
    pub key: String,
    pub retry_after_secs: u64,
}

/// Outcome of a successful increment, surfaced as response metadata.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    /// Requests left in the current window.
    pub remaining: u64,
    /// Seconds until the window closes.
    pub reset_secs: u64,
    /// The configured per-window limit.
    pub limit: u64,
}

struct Window {
    count: u64,
    resets_at: Instant,
}

struct LimiterState {
    windows: HashMap<String, Window>,
    last_purge: Instant,
}

/// Per-key fixed-window request counter.
///
/// Increment and compare happen under a single lock acquisition, so
/// concurrent requests sharing a key can never both consume the last slot.
/// State lives in process memory; a multi-instance deployment needs an
/// external shared counter store instead.
pub struct RateLimiter {
    limit: u64,
    period: Duration,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(limit: u64, period: Duration) -> Self {
        Self {
            limit,
            period,
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                last_purge: Instant::now(),
            }),
        }
    }

    /// A limit of zero disables the limiter entirely.
    pub fn is_disabled(&self) -> bool {
        self.limit == 0
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Count one request for `key` in its current window.
    ///
    /// The increment is recorded even when it pushes the count over the
    /// limit, so a client hammering the gate keeps getting rejected until
    /// the window rolls over.
    pub fn increment(&self, key: &str) -> Result<RateLimitInfo, RateLimitExceeded> {
        if self.is_disabled() {
            return Ok(RateLimitInfo {
                remaining: 0,
                reset_secs: 0,
                limit: 0,
            });
        }

        let now = Instant::now();
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");

        // Drop stale windows at most once per period so memory stays
        // bounded by the set of recently active keys.
        if now.duration_since(state.last_purge) >= self.period {
            state.windows.retain(|_, w| w.resets_at > now);
            state.last_purge = now;
        }

        let window = state
            .windows
            .entry(key.to_string())
            .and_modify(|w| {
                if w.resets_at <= now {
                    w.count = 0;
                    w.resets_at = now + self.period;
                }
            })
            .or_insert_with(|| Window {
                count: 0,
                resets_at: now + self.period,
            });

        window.count += 1;
        let reset_secs = window.resets_at.duration_since(now).as_secs();

        if window.count > self.limit {
            return Err(RateLimitExceeded {
                key: key.to_string(),
                retry_after_secs: reset_secs,
            });
        }

        Ok(RateLimitInfo {
            remaining: self.limit - window.count,
            reset_secs,
            limit: self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_window_sequence() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));

        for expected in [4, 3, 2, 1, 0] {
            let info = limiter.increment("10.0.0.1").unwrap();
            assert_eq!(info.remaining, expected);
            assert_eq!(info.limit, 5);
            assert!(info.reset_secs <= 60);
        }

        let err = limiter.increment("10.0.0.1").unwrap_err();
        assert_eq!(err.key, "10.0.0.1");
        assert!(err.retry_after_secs <= 60);

        // Still rejected: the over-limit increment was not rolled back.
        assert!(limiter.increment("10.0.0.1").is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.increment("a").is_ok());
        assert!(limiter.increment("b").is_ok());
        assert!(limiter.increment("a").is_err());
    }

    #[test]
    fn test_window_rollover_restores_allowance() {
        let limiter = RateLimiter::new(5, Duration::from_millis(50));

        for _ in 0..5 {
            limiter.increment("k").unwrap();
        }
        assert!(limiter.increment("k").is_err());

        std::thread::sleep(Duration::from_millis(60));

        let info = limiter.increment("k").unwrap();
        assert_eq!(info.remaining, 4);
    }

    #[test]
    fn test_zero_limit_never_rejects() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60));
        assert!(limiter.is_disabled());
        for _ in 0..1000 {
            limiter.increment("k").unwrap();
        }
    }

    #[test]
    fn test_stale_windows_are_purged() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));
        limiter.increment("gone").unwrap();

        std::thread::sleep(Duration::from_millis(30));
        limiter.increment("fresh").unwrap();

        let state = limiter.state.lock().unwrap();
        assert!(!state.windows.contains_key("gone"));
        assert!(state.windows.contains_key("fresh"));
    }

    #[test]
    fn test_concurrent_increments_never_over_admit() {
        let limit = 8;
        let limiter = Arc::new(RateLimiter::new(limit, Duration::from_secs(60)));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.increment("shared").is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count() as u64;

        assert_eq!(successes, limit);
    }
}
