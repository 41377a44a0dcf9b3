//! Per-requester fixed-window rate limiting.
//!
//! Each requester (usually a chat id) owns a [`RateWindow`]: a counter and
//! the instant its window began. An attempt is admitted while the window
//! has rolled over or the counter is below the limit. The first attempt
//! after rollover starts a fresh window.
//!
//! This is a fixed window with reset-on-expiry, not a sliding log: a
//! requester can land up to `2 * max_requests` admissions across a window
//! boundary. Rejected attempts never touch the window.
//!
//! ```text
//!  window_start                     window_start + window
//!       │ admit  admit  admit  reject  reject │ admit (count = 1)
//!       ├─────────────────────────────────────┼──────────────▶ time
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::{HuginnError, Result};

/// Default window length: 20 seconds.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(20);

/// Default number of admissions per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 3;

/// Identifier that partitions rate-limit state, e.g. a Telegram chat id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequesterKey(String);

impl RequesterKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequesterKey {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequesterKey {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for RequesterKey {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<i64> for RequesterKey {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for RequesterKey {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&RequesterKey> for RequesterKey {
    fn from(key: &RequesterKey) -> Self {
        key.clone()
    }
}

/// Configuration for a [`RateLimiter`].
///
/// ```rust
/// # use huginn::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .window(Duration::from_secs(60))
///     .max_requests(10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Window length. Default: 20s.
    pub window: Duration,
    /// Admissions allowed per window. Default: 3.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_RATE_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn max_requests(mut self, n: u32) -> Self {
        self.max_requests = n;
        self
    }
}

/// Attempt counter for one requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Admissions observed in the current window.
    pub count: u32,
    /// When the current window began.
    pub window_start: Instant,
}

/// Outcome of [`RateLimiter::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The attempt was counted; `remaining` more fit in this window.
    Admitted { remaining: u32 },
    /// The window is full. It rolls over after `retry_after`.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Fixed-window rate limiter keyed by requester.
///
/// Windows are created lazily on a requester's first attempt. Each
/// `try_acquire` is a single critical section, so check-then-increment is
/// atomic across threads.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<RequesterKey, RateWindow>>,
}

impl RateLimiter {
    /// Create a limiter.
    ///
    /// Fails with [`HuginnError::Configuration`] for a zero window or a
    /// zero request budget.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        if config.window.is_zero() {
            return Err(HuginnError::Configuration(
                "rate window must be greater than zero".to_string(),
            ));
        }
        if config.max_requests == 0 {
            return Err(HuginnError::Configuration(
                "max_requests per window must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config,
            windows: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequesterKey, RateWindow>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to admit one attempt for `requester` at `now`.
    pub fn try_acquire(&self, requester: &RequesterKey, now: Instant) -> Admission {
        let mut windows = self.lock();
        let window = windows.entry(requester.clone()).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });

        let mut elapsed = now.saturating_duration_since(window.window_start);
        if elapsed >= self.config.window {
            *window = RateWindow {
                count: 0,
                window_start: now,
            };
            elapsed = Duration::ZERO;
        }

        if window.count >= self.config.max_requests {
            return Admission::Rejected {
                retry_after: self.config.window - elapsed,
            };
        }

        window.count += 1;
        Admission::Admitted {
            remaining: self.config.max_requests - window.count,
        }
    }

    /// Snapshot of the window tracked for `requester`.
    pub fn window(&self, requester: &RequesterKey) -> Option<RateWindow> {
        self.lock().get(requester).copied()
    }

    /// Number of requesters with a tracked window.
    pub fn tracked_requesters(&self) -> usize {
        self.lock().len()
    }

    /// Forget every window that has rolled over by `now`.
    ///
    /// The next attempt from a purged requester starts a fresh window, which
    /// is what it would have done anyway, so purging never changes an
    /// admission decision. Returns how many windows were dropped.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.window_start) < self.config.window);
        before - windows.len()
    }

    /// Drop the window for `requester`, restoring its full budget.
    pub fn reset(&self, requester: &RequesterKey) -> bool {
        self.lock().remove(requester).is_some()
    }
}
