//! Sliding-window rate limiting for sensitive account flows.
//!
//! Tracks request counts per identity key (email address or IP) and denies
//! requests past the configured maximum until the window elapses. State is
//! process-local and best-effort: a restart loses all windows.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;
use crate::config::SecurityConfig;

/// Configuration for rate limiting.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the time window.
    pub max_requests: u32,
    /// Time window for counting requests, in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Create a new rate limit configuration.
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window_secs: 15 * 60,
        }
    }
}

impl From<&SecurityConfig> for RateLimitConfig {
    fn from(config: &SecurityConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window_secs: config.window_secs,
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is allowed.
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Seconds until the window resets; zero when allowed.
    pub retry_after_secs: u64,
}

impl RateLimitDecision {
    /// Check if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

/// Request counter for a single key.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    /// Requests counted in the current window.
    count: u32,
    /// When the current window elapses.
    window_reset_at: DateTime<Utc>,
}

impl WindowRecord {
    /// A record is logically expired once its window has passed.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.window_reset_at
    }
}

/// Sliding-window rate limiter keyed by identity string.
///
/// Each instance owns its own record map; construct one per process (or per
/// test) and share it behind an `Arc`. Time comes from the injected clock so
/// window expiry is testable without sleeping.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use gradetrack::clock::SystemClock;
/// use gradetrack::rate_limit::{RateLimitConfig, RateLimiter};
///
/// let limiter = RateLimiter::new(RateLimitConfig::new(3, 900), Arc::new(SystemClock));
/// let decision = limiter.check("student@example.com");
/// assert!(decision.is_allowed());
/// assert_eq!(decision.remaining, 2);
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    /// Rate limit configuration.
    config: RateLimitConfig,
    /// Per-key window records.
    records: RwLock<HashMap<String, WindowRecord>>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration and clock.
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Normalize a key so differently-cased or padded inputs collide.
    fn normalize(key: &str) -> String {
        key.trim().to_lowercase()
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.config.window_secs as i64)
    }

    /// Seconds until the window resets, rounded up.
    fn retry_after(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
        let millis = (reset_at - now).num_milliseconds().max(0);
        (millis as u64).div_ceil(1000)
    }

    /// Check and count a request for the given key.
    ///
    /// The check-then-increment happens under a single write lock, so two
    /// concurrent requests can never both slip past the limit. Denied
    /// requests are not counted and do not extend the window.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let key = Self::normalize(key);
        let now = self.clock.now();

        let mut records = self.records.write().unwrap();
        let record = records
            .get(&key)
            .copied()
            .filter(|r| !r.is_expired(now));

        match record {
            Some(mut record) => {
                if record.count >= self.config.max_requests {
                    let retry_after_secs = Self::retry_after(record.window_reset_at, now);
                    debug!(key = %key, retry_after_secs, "rate limit exceeded");
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        retry_after_secs,
                    };
                }
                record.count += 1;
                let remaining = self.config.max_requests - record.count;
                records.insert(key, record);
                RateLimitDecision {
                    allowed: true,
                    remaining,
                    retry_after_secs: 0,
                }
            }
            None => {
                // Fresh window: absent key, or a stale record self-heals here.
                records.insert(
                    key,
                    WindowRecord {
                        count: 1,
                        window_reset_at: now + self.window(),
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: self.config.max_requests - 1,
                    retry_after_secs: 0,
                }
            }
        }
    }

    /// Delete the record for a key unconditionally.
    ///
    /// Called after a successful password reset so the user can retry
    /// immediately instead of waiting out the window.
    pub fn reset(&self, key: &str) {
        let key = Self::normalize(key);
        self.records.write().unwrap().remove(&key);
    }

    /// Delete all records whose window has elapsed.
    ///
    /// Purely memory-bound maintenance; `check` self-heals expired records on
    /// access, so correctness never depends on the sweep. Expired keys are
    /// snapshotted under the read lock first, then removed one at a time with
    /// a re-check, so the write lock is never held across the whole scan.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();

        let expired: Vec<String> = {
            let records = self.records.read().unwrap();
            records
                .iter()
                .filter(|(_, r)| r.is_expired(now))
                .map(|(k, _)| k.clone())
                .collect()
        };

        let mut removed = 0;
        for key in expired {
            let mut records = self.records.write().unwrap();
            if records.get(&key).is_some_and(|r| r.is_expired(now)) {
                records.remove(&key);
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "swept expired rate-limit records");
        }
        removed
    }

    /// Number of keys currently tracked (expired or not).
    pub fn tracked_keys(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

/// Run `sweep` on a fixed interval for the lifetime of the process.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    interval: StdDuration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiter.sweep();
        }
    })
}
