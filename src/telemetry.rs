//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `gate`: name of the [`ResponseGate`](crate::ResponseGate) instance
//! - `provider`: generator name (e.g. "groq", "openrouter")
//! - `status`: outcome: "ok" or "error"

/// Total cache hits.
///
/// Labels: `gate`.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total cache misses.
///
/// Labels: `gate`.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total entries evicted to make room for a new key.
///
/// Labels: `gate`.
pub const CACHE_EVICTIONS_TOTAL: &str = "huginn_cache_evictions_total";

/// Total cache misses rejected by the rate limiter.
///
/// Labels: `gate`.
pub const THROTTLED_TOTAL: &str = "huginn_throttled_total";

/// Total generator invocations after admission.
///
/// Labels: `gate`, `status` ("ok" | "error").
pub const GENERATIONS_TOTAL: &str = "huginn_generations_total";

/// Generator duration in seconds.
///
/// Labels: `gate`.
pub const GENERATION_DURATION_SECONDS: &str = "huginn_generation_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Total fallbacks from one provider to the next. A failure of the last
/// provider in a chain is not counted.
///
/// Labels: `provider` (the provider that failed).
pub const FALLBACKS_TOTAL: &str = "huginn_fallbacks_total";
