use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use huginn::providers::retry::{RetryConfig, RetryingGenerator};
use huginn::providers::traits::ReplyGenerator;
use huginn::{HuginnError, ReplyRequest, Result};

/// Mock generator that fails N times then succeeds.
struct FailThenSucceed {
    fail_count: AtomicU32,
    fail_with: fn() -> HuginnError,
    total_calls: AtomicU32,
}

impl FailThenSucceed {
    fn new(failures: u32, fail_with: fn() -> HuginnError) -> Self {
        Self {
            fail_count: AtomicU32::new(failures),
            fail_with,
            total_calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReplyGenerator for FailThenSucceed {
    fn name(&self) -> &str {
        "mock-retry"
    }

    async fn generate(&self, _request: &ReplyRequest) -> Result<String> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_count.fetch_sub(1, Ordering::Relaxed);
            return Err((self.fail_with)());
        }
        Ok("ok".into())
    }
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig::new()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
}

fn wrap(inner: &Arc<FailThenSucceed>, config: RetryConfig) -> RetryingGenerator {
    let inner: Arc<dyn ReplyGenerator> = inner.clone();
    RetryingGenerator::new(inner, config)
}

// ============================================================================
// RetryConfig
// ============================================================================

#[test]
fn retry_config_defaults() {
    let config = RetryConfig::default();
    assert_eq!(config.max_attempts, 2);
    assert_eq!(config.initial_delay, Duration::from_millis(500));
    assert_eq!(config.max_delay, Duration::from_secs(10));
}

#[test]
fn retry_config_disabled_is_single_attempt() {
    assert_eq!(RetryConfig::disabled().max_attempts, 1);
}

// ============================================================================
// RetryingGenerator
// ============================================================================

#[tokio::test]
async fn retries_transient_then_succeeds() {
    let inner = Arc::new(FailThenSucceed::new(2, || HuginnError::Http(
        "connection reset".into(),
    )));
    let generator = wrap(&inner, fast_retry(3));

    let reply = generator.generate(&ReplyRequest::new("hi")).await.unwrap();
    assert_eq!(reply, "ok");
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let inner = Arc::new(FailThenSucceed::new(10, || HuginnError::Api {
        status: 502,
        message: "bad gateway".into(),
    }));
    let generator = wrap(&inner, fast_retry(3));

    let err = generator.generate(&ReplyRequest::new("hi")).await.unwrap_err();
    assert!(matches!(err, HuginnError::Api { status: 502, .. }));
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn permanent_error_is_not_retried() {
    let inner = Arc::new(FailThenSucceed::new(1, || HuginnError::AuthenticationFailed));
    let generator = wrap(&inner, fast_retry(5));

    let err = generator.generate(&ReplyRequest::new("hi")).await.unwrap_err();
    assert!(matches!(err, HuginnError::AuthenticationFailed));
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let inner = Arc::new(FailThenSucceed::new(1, || HuginnError::Api {
        status: 400,
        message: "bad request".into(),
    }));
    let generator = wrap(&inner, fast_retry(5));

    assert!(generator.generate(&ReplyRequest::new("hi")).await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn disabled_config_makes_one_attempt() {
    let inner = Arc::new(FailThenSucceed::new(1, || HuginnError::RateLimited {
        retry_after: None,
    }));
    let generator = wrap(&inner, RetryConfig::disabled());

    assert!(generator.generate(&ReplyRequest::new("hi")).await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_hint_sets_the_delay() {
    let inner = Arc::new(FailThenSucceed::new(1, || HuginnError::RateLimited {
        retry_after: Some(Duration::from_secs(3)),
    }));
    let generator = wrap(
        &inner,
        RetryConfig::new()
            .max_attempts(2)
            .max_delay(Duration::from_secs(10)),
    );

    let started = tokio::time::Instant::now();
    let reply = generator.generate(&ReplyRequest::new("hi")).await.unwrap();
    assert_eq!(reply, "ok");
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(3), "waited {waited:?}");
    assert!(waited < Duration::from_secs(4), "waited {waited:?}");
}

#[tokio::test]
async fn name_is_delegated() {
    let inner = Arc::new(FailThenSucceed::new(0, || HuginnError::EmptyResponse));
    let generator = wrap(&inner, RetryConfig::default());
    assert_eq!(generator.name(), "mock-retry");
}
