//! Cache-then-limit admission gate.
//!
//! [`ResponseGate`] is the single entry point for expensive operations. It
//! owns one [`BoundedCache`] and one [`RateLimiter`]:
//!
//! ```text
//! resolve(key, requester, generate)
//!     │
//!     ├─ cache hit ───────────────────────────▶ Cached(value)   (limiter bypassed)
//!     │
//!     └─ miss ─▶ try_acquire(requester)
//!                   ├─ rejected ──────────────▶ Throttled       (nothing else touched)
//!                   └─ admitted ─▶ generate().await
//!                                   ├─ Err(e) ▶ Err(e)          (not cached, slot stays used)
//!                                   └─ Ok(v) ─▶ put(key, v) ──▶ Generated(value)
//! ```
//!
//! No lock is held across the generator `.await`. Concurrent misses for the
//! same key are not coalesced: each one consumes a rate-limit slot and calls
//! the generator. The gate imposes no timeout and no retry; both belong to
//! the generator.

mod builder;

pub use builder::ResponseGateBuilder;

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::cache::{BoundedCache, CacheConfig, CacheStats, ReplyKey};
use crate::limiter::{Admission, RateLimitConfig, RateLimiter, RequesterKey};
use crate::providers::ReplyGenerator;
use crate::telemetry;
use crate::types::ReplyRequest;
use crate::{HuginnError, Result};

/// Outcome of [`ResponseGate::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Served from cache; the generator and limiter were not consulted.
    Cached(String),
    /// Freshly generated and now cached.
    Generated(String),
    /// Rejected by the rate limiter. The caller decides what to tell the user.
    Throttled { retry_after: Duration },
}

impl Resolution {
    /// The reply text, unless throttled.
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Cached(v) | Resolution::Generated(v) => Some(v),
            Resolution::Throttled { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Resolution::Cached(v) | Resolution::Generated(v) => Some(v),
            Resolution::Throttled { .. } => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Resolution::Cached(_))
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, Resolution::Throttled { .. })
    }
}

/// Items removed by [`ResponseGate::purge_expired`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purged {
    pub cache_entries: usize,
    pub rate_windows: usize,
}

/// Snapshot of gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    pub cache: CacheStats,
    pub tracked_requesters: usize,
}

/// Response cache plus per-requester rate limiter.
///
/// Construct via [`ResponseGate::builder()`]. Each feature that needs
/// admission control can own its own gate; gates share nothing.
pub struct ResponseGate {
    name: String,
    cache: BoundedCache<String>,
    limiter: RateLimiter,
}

impl ResponseGate {
    /// Create a new builder with default limits.
    pub fn builder() -> ResponseGateBuilder {
        ResponseGateBuilder::new()
    }

    /// Create a gate from explicit configs. Fails fast on invalid limits.
    pub fn new(
        name: impl Into<String>,
        cache: &CacheConfig,
        rate_limit: RateLimitConfig,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            cache: BoundedCache::new(cache)?,
            limiter: RateLimiter::new(rate_limit)?,
        })
    }

    /// Gate name, used as the `gate` metrics label.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self) -> &BoundedCache<String> {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Resolve `cache_key` from cache, or generate it if `requester` is
    /// within its rate limit.
    ///
    /// Generator errors are returned unchanged and nothing is cached for
    /// them. The rate-limit slot consumed by a failed generation is not
    /// given back.
    #[instrument(skip_all, fields(gate = %self.name, key = cache_key))]
    pub async fn resolve<F, Fut, E>(
        &self,
        cache_key: &str,
        requester: impl Into<RequesterKey>,
        generate: F,
    ) -> std::result::Result<Resolution, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<String, E>>,
    {
        if let Some(value) = self.cache.get(cache_key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "gate" => self.name.clone())
                .increment(1);
            debug!("cache hit");
            return Ok(Resolution::Cached(value));
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "gate" => self.name.clone())
            .increment(1);

        let requester = requester.into();
        match self.limiter.try_acquire(&requester, Instant::now()) {
            Admission::Rejected { retry_after } => {
                metrics::counter!(telemetry::THROTTLED_TOTAL, "gate" => self.name.clone())
                    .increment(1);
                debug!(
                    %requester,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "throttled"
                );
                return Ok(Resolution::Throttled { retry_after });
            }
            Admission::Admitted { remaining } => {
                debug!(%requester, remaining, "cache miss, admitted");
            }
        }

        let started = Instant::now();
        let outcome = generate().await;
        metrics::histogram!(telemetry::GENERATION_DURATION_SECONDS, "gate" => self.name.clone())
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(value) => {
                metrics::counter!(telemetry::GENERATIONS_TOTAL,
                    "gate" => self.name.clone(),
                    "status" => "ok",
                )
                .increment(1);
                if let Some(evicted) = self.cache.put(cache_key, value.clone()) {
                    metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "gate" => self.name.clone())
                        .increment(1);
                    debug!(%evicted, "cache evict");
                }
                Ok(Resolution::Generated(value))
            }
            Err(e) => {
                metrics::counter!(telemetry::GENERATIONS_TOTAL,
                    "gate" => self.name.clone(),
                    "status" => "error",
                )
                .increment(1);
                debug!("generator failed, nothing cached");
                Err(e)
            }
        }
    }

    /// Resolve an AI reply: key from `key`, generation via `generator`.
    ///
    /// `key` and `request` must describe the same prompt (after trimming),
    /// otherwise [`HuginnError::InvalidInput`] is returned before the cache
    /// or limiter is touched. The request's model override is folded into
    /// the cache key, replacing any model set on `key`.
    pub async fn resolve_reply(
        &self,
        key: &ReplyKey,
        requester: impl Into<RequesterKey>,
        generator: &dyn ReplyGenerator,
        request: &ReplyRequest,
    ) -> Result<Resolution> {
        if key.prompt() != request.prompt.trim() {
            return Err(HuginnError::InvalidInput(format!(
                "reply key prompt {:?} does not match request prompt {:?}",
                key.prompt(),
                request.prompt
            )));
        }

        let cache_key = key.clone().with_model(request.model.clone()).cache_key();
        self.resolve(&cache_key, requester, || generator.generate(request))
            .await
    }

    /// Drop every cached reply. Rate-limit state is kept.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Periodic maintenance: drop expired cache entries and rolled-over
    /// rate windows. Never changes an admission decision.
    pub fn purge_expired(&self) -> Purged {
        Purged {
            cache_entries: self.cache.purge_expired(),
            rate_windows: self.limiter.purge_expired(Instant::now()),
        }
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            cache: self.cache.stats(),
            tracked_requesters: self.limiter.tracked_requesters(),
        }
    }
}
