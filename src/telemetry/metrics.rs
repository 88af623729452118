//! Per-operation client metrics.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::RwLock;
use serde::Serialize;

use super::span::{ActiveSpan, SpanStatus};
use crate::{instrumenter::OperationListener, request::DbRequest};

/// Default latency histogram buckets (in seconds).
fn default_latency_buckets() -> Vec<f64> {
    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
}

/// Operation key used for dial calls.
pub const DIAL_OPERATION: &str = "dial";

/// Operation key used when the command had no classifiable verb.
pub const UNKNOWN_OPERATION: &str = "unknown";

/// Configuration for metrics collection.
///
/// ## Example
///
/// ```rust
/// use dbtel::telemetry::MetricsConfig;
///
/// let config = MetricsConfig::builder()
///     .namespace("sql.mysql")
///     .latency_buckets(vec![0.01, 0.1, 1.0])
///     .build();
/// assert_eq!(config.latency_buckets.len(), 3);
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct MetricsConfig {
    /// Prefix for all metric names.
    #[builder(into, default = "sql.mysql".to_string())]
    pub namespace: String,
    /// Histogram bucket upper bounds for latency (in seconds).
    #[builder(default = default_latency_buckets())]
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Collects call counts, outcomes, latency and concurrency per operation.
///
/// Registered as an [`OperationListener`], it keys every call by operation:
/// [`DIAL_OPERATION`] for dials, the classified verb for executes and
/// [`UNKNOWN_OPERATION`] when the verb is empty.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use dbtel::telemetry::{DbClientMetrics, MetricsConfig};
///
/// let metrics = DbClientMetrics::new(MetricsConfig::default());
/// metrics.record("SELECT", Duration::from_millis(3), true);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.operations["SELECT"].total, 1);
/// ```
#[derive(Debug, Clone)]
pub struct DbClientMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    config: MetricsConfig,
    operations: RwLock<HashMap<String, OperationStats>>,
}

#[derive(Debug)]
struct OperationStats {
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    in_flight: AtomicI64,
    // Simplified histogram: sum, count and per-bucket counts.
    latency_sum_ns: AtomicU64,
    latency_count: AtomicU64,
    latency_buckets: Vec<AtomicU64>,
}

impl OperationStats {
    fn new(bucket_count: usize) -> Self {
        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            in_flight: AtomicI64::new(0),
            latency_sum_ns: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            latency_buckets: (0..bucket_count).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    fn record(&self, config: &MetricsConfig, latency: Duration, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
        }

        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.latency_sum_ns.fetch_add(nanos, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);

        let seconds = latency.as_secs_f64();
        for (bound, bucket) in config.latency_buckets.iter().zip(&self.latency_buckets) {
            if seconds <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Zeroes every completed-call counter, leaving the in-flight gauge.
    fn clear_completed(&self) {
        let counters =
            [&self.total, &self.success, &self.failure, &self.latency_sum_ns, &self.latency_count];
        for counter in counters.into_iter().chain(&self.latency_buckets) {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl DbClientMetrics {
    /// Creates a new collector with the given configuration.
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            inner: Arc::new(MetricsInner { config, operations: RwLock::new(HashMap::new()) }),
        }
    }

    /// Returns the metrics configuration.
    pub fn config(&self) -> &MetricsConfig {
        &self.inner.config
    }

    /// Runs `f` on the counters of `operation`, creating them if needed.
    ///
    /// `f` runs under the map lock so that [`reset`](Self::reset) never
    /// interleaves with an update.
    fn with_stats<T>(&self, operation: &str, f: impl FnOnce(&OperationStats) -> T) -> T {
        if let Some(stats) = self.inner.operations.read().get(operation) {
            return f(stats);
        }
        let bucket_count = self.inner.config.latency_buckets.len();
        let mut operations = self.inner.operations.write();
        let stats = operations
            .entry(operation.to_owned())
            .or_insert_with(|| OperationStats::new(bucket_count));
        f(stats)
    }

    /// Marks one call of `operation` as started.
    pub fn record_start(&self, operation: &str) {
        self.with_stats(operation, |stats| stats.in_flight.fetch_add(1, Ordering::Relaxed));
    }

    /// Records a completed call of `operation`.
    pub fn record(&self, operation: &str, latency: Duration, success: bool) {
        self.with_stats(operation, |stats| stats.record(&self.inner.config, latency, success));
    }

    /// Marks one call of `operation` as finished and records its outcome.
    pub fn record_end(&self, operation: &str, latency: Duration, success: bool) {
        self.with_stats(operation, |stats| {
            stats.record(&self.inner.config, latency, success);
            stats.in_flight.fetch_sub(1, Ordering::Relaxed);
        });
    }

    /// Marks one started call of `operation` as discarded without an outcome.
    pub fn record_abandon(&self, operation: &str) {
        self.with_stats(operation, |stats| stats.in_flight.fetch_sub(1, Ordering::Relaxed));
    }

    /// Returns a point-in-time copy of every operation's counters.
    pub fn snapshot(&self) -> DbMetricsSnapshot {
        let buckets = &self.inner.config.latency_buckets;
        let operations = self
            .inner
            .operations
            .read()
            .iter()
            .map(|(operation, stats)| {
                let latency_count = stats.latency_count.load(Ordering::Relaxed);
                let latency_sum_ns = stats.latency_sum_ns.load(Ordering::Relaxed);
                let avg_latency_ms = if latency_count > 0 {
                    (latency_sum_ns as f64 / latency_count as f64) / 1_000_000.0
                } else {
                    0.0
                };
                let latency_buckets = buckets
                    .iter()
                    .zip(&stats.latency_buckets)
                    .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
                    .collect();

                let snapshot = OperationSnapshot {
                    total: stats.total.load(Ordering::Relaxed),
                    success: stats.success.load(Ordering::Relaxed),
                    failure: stats.failure.load(Ordering::Relaxed),
                    in_flight: stats.in_flight.load(Ordering::Relaxed),
                    latency_count,
                    avg_latency_ms,
                    latency_buckets,
                };
                (operation.clone(), snapshot)
            })
            .collect();

        DbMetricsSnapshot { namespace: self.inner.config.namespace.clone(), operations }
    }

    /// Clears every completed-call counter.
    ///
    /// Calls still in flight keep their gauge, so their later end leaves
    /// it at zero rather than negative. Operations with nothing in flight
    /// are dropped from the snapshot.
    pub fn reset(&self) {
        self.inner.operations.write().retain(|_, stats| {
            stats.clear_completed();
            stats.in_flight.load(Ordering::Relaxed) != 0
        });
    }
}

/// Maps a request to its metrics key.
fn operation_key(request: &DbRequest) -> &str {
    match request.operation() {
        None => DIAL_OPERATION,
        Some("") => UNKNOWN_OPERATION,
        Some(operation) => operation,
    }
}

impl OperationListener<DbRequest> for DbClientMetrics {
    fn on_start(&self, _span: &ActiveSpan, request: &DbRequest) {
        self.record_start(operation_key(request));
    }

    fn on_end(&self, span: &ActiveSpan, request: &DbRequest, status: &SpanStatus) {
        self.record_end(operation_key(request), span.elapsed(), !status.is_error());
    }

    fn on_abandon(&self, _span: &ActiveSpan, request: &DbRequest) {
        self.record_abandon(operation_key(request));
    }
}

/// A point-in-time snapshot of client metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbMetricsSnapshot {
    /// Metric name prefix.
    pub namespace: String,
    /// Counters per operation key.
    pub operations: BTreeMap<String, OperationSnapshot>,
}

impl DbMetricsSnapshot {
    /// Returns the counters for `operation`, if any call was seen.
    pub fn operation(&self, operation: &str) -> Option<&OperationSnapshot> {
        self.operations.get(operation)
    }

    /// Returns the total call count across operations.
    pub fn total(&self) -> u64 {
        self.operations.values().map(|op| op.total).sum()
    }

    /// Returns the snapshot as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Counters for one operation key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSnapshot {
    /// Completed calls.
    pub total: u64,
    /// Calls that completed without error.
    pub success: u64,
    /// Calls that completed with an error.
    pub failure: u64,
    /// Calls started but not yet finished.
    pub in_flight: i64,
    /// Number of latency samples.
    pub latency_count: u64,
    /// Mean latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Cumulative counts per bucket upper bound (seconds).
    pub latency_buckets: Vec<(f64, u64)>,
}

impl OperationSnapshot {
    /// Returns the fraction of completed calls that failed.
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.failure as f64 / self.total as f64 }
    }
}
