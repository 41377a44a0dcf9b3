//! Builder for configuring gate instances

use std::time::Duration;

use super::ResponseGate;
use crate::Result;
use crate::cache::CacheConfig;
use crate::limiter::RateLimitConfig;

/// Builder for [`ResponseGate`].
///
/// ```rust
/// # use huginn::ResponseGate;
/// # use std::time::Duration;
/// let gate = ResponseGate::builder()
///     .name("ai-reply")
///     .max_cache_entries(100)
///     .rate_window(Duration::from_secs(20))
///     .max_requests_per_window(3)
///     .build()?;
/// # Ok::<(), huginn::HuginnError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ResponseGateBuilder {
    name: String,
    cache: CacheConfig,
    rate_limit: RateLimitConfig,
}

impl ResponseGateBuilder {
    pub fn new() -> Self {
        Self {
            name: "default".to_string(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// Name used as the `gate` label on metrics and log spans.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Maximum cached replies (default: 100).
    pub fn max_cache_entries(mut self, n: usize) -> Self {
        self.cache.max_entries = n;
        self
    }

    /// Expire cached replies older than `ttl` (default: never).
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = Some(ttl);
        self
    }

    /// Rate-limit window length (default: 20s).
    pub fn rate_window(mut self, window: Duration) -> Self {
        self.rate_limit.window = window;
        self
    }

    /// Generator calls admitted per requester per window (default: 3).
    pub fn max_requests_per_window(mut self, n: u32) -> Self {
        self.rate_limit.max_requests = n;
        self
    }

    /// Replace the whole cache configuration.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Replace the whole rate-limit configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Build the gate. Invalid limits fail here, never at call time.
    pub fn build(self) -> Result<ResponseGate> {
        ResponseGate::new(self.name, &self.cache, self.rate_limit)
    }
}

impl Default for ResponseGateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
