//! Tests for metrics emitted by the gate and generator decorators.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

use huginn::telemetry;
use huginn::{
    FallbackGenerator, HuginnError, ReplyGenerator, ReplyRequest, ResponseGate, Result,
    RetryConfig, RetryingGenerator,
};

// ============================================================================
// Mock generators
// ============================================================================

struct Failing;

#[async_trait]
impl ReplyGenerator for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: &ReplyRequest) -> Result<String> {
        Err(HuginnError::Http("connection refused".into()))
    }
}

struct Echo;

#[async_trait]
impl ReplyGenerator for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<String> {
        Ok(request.prompt.clone())
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
fn recorded<F: Future>(fut: F) -> (F::Output, Snapshotter) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let output = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
    });
    (output, snapshotter)
}

fn gate(max_requests: u32) -> ResponseGate {
    ResponseGate::builder()
        .name("metrics")
        .max_requests_per_window(max_requests)
        .build()
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn gate_records_hits_misses_and_throttles() {
    let gate = gate(1);
    let request = ReplyRequest::new("hi");

    let (_, snapshotter) = recorded(async {
        let ok = || async { Ok::<_, HuginnError>("v".to_string()) };
        gate.resolve("a", "chat", ok).await.unwrap();
        gate.resolve("a", "chat", ok).await.unwrap();
        gate.resolve("b", "chat", ok).await.unwrap();
        gate.resolve_reply(&huginn::ReplyKey::new("hi"), "other", &Echo, &request)
            .await
            .unwrap();
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 3);
    assert_eq!(counter_total(&snapshot, telemetry::THROTTLED_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::GENERATIONS_TOTAL), 2);
    assert!(
        has_histogram(&snapshot, telemetry::GENERATION_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn gate_records_evictions() {
    let gate = ResponseGate::builder()
        .max_cache_entries(1)
        .build()
        .unwrap();

    let (_, snapshotter) = recorded(async {
        for key in ["a", "b", "c"] {
            gate.resolve(key, "chat", || async { Ok::<_, HuginnError>(key.to_string()) })
                .await
                .unwrap();
        }
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_EVICTIONS_TOTAL), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retries_and_fallbacks_are_counted() {
    let failing: Arc<dyn ReplyGenerator> = Arc::new(Failing);
    let retrying: Arc<dyn ReplyGenerator> = Arc::new(RetryingGenerator::new(
        failing,
        RetryConfig::new()
            .max_attempts(3)
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(2)),
    ));
    let chain = FallbackGenerator::new()
        .with(retrying)
        .with(Arc::new(Echo));

    let (reply, snapshotter) = recorded(chain.generate(&ReplyRequest::new("hello")));
    assert_eq!(reply.unwrap(), "hello");

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 2);
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failing_last_provider_is_not_a_fallback() {
    let chain = FallbackGenerator::new()
        .with(Arc::new(Failing))
        .with(Arc::new(Failing));

    let (reply, snapshotter) = recorded(chain.generate(&ReplyRequest::new("hello")));
    assert!(reply.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let gate = gate(3);
    let resolution = gate
        .resolve("k", "chat", || async { Ok::<_, HuginnError>("v".to_string()) })
        .await
        .unwrap();
    assert_eq!(resolution.value(), Some("v"));
}
