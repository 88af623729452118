//! The MySQL instrumentation bundle: a ready-made pipeline plus the hooks
//! and metrics that go with it.

use std::sync::{Arc, OnceLock};

use crate::{
    client::{Dialer, InstrumentedDialer},
    config::{FeatureEnabler, InstrumentationConfig},
    correlation::DbHooks,
    instrumenter::{DbSpanNameExtractor, InstrumentationScope, Instrumenter},
    request::{DbRequest, DbResponse},
    semconv::{DbClientAttributesExtractor, MySqlAttributesGetter},
    telemetry::{DbClientMetrics, MetricsConfig, SpanProcessor, TracingSpanProcessor},
};

/// Assembles the standard MySQL pipeline.
///
/// Spans are named from operation and namespace, carry the database client
/// attributes, feed `metrics` and are handed to `processor`.
pub fn build_mysql_instrumenter(
    config: &InstrumentationConfig,
    processor: impl SpanProcessor,
    metrics: DbClientMetrics,
) -> Instrumenter<DbRequest, DbResponse> {
    let getter = MySqlAttributesGetter::new(config.system.as_str(), config.placeholder);
    let scope = InstrumentationScope::builder()
        .name(config.scope_name.as_str())
        .version(config.scope_version.as_str())
        .build();

    Instrumenter::builder(DbSpanNameExtractor::new(getter.clone()))
        .instrumentation_scope(scope)
        .add_attributes_extractor(
            DbClientAttributesExtractor::new(getter).with_record_statement(config.record_statement),
        )
        .add_operation_listener(Arc::new(metrics))
        .span_processor(processor)
        .build()
}

/// Hooks and metrics for MySQL clients, built once and shared.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use dbtel::{
///     config::{FeatureEnabler, InstrumentationConfig},
///     mysql::MySqlInstrumentation,
///     telemetry::NoopSpanProcessor,
/// };
///
/// let instrumentation = MySqlInstrumentation::new(
///     InstrumentationConfig::default(),
///     Arc::new(FeatureEnabler::default()),
///     NoopSpanProcessor,
/// );
/// assert!(instrumentation.metrics().snapshot().operations.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MySqlInstrumentation {
    hooks: Arc<DbHooks>,
    metrics: DbClientMetrics,
}

impl MySqlInstrumentation {
    /// Builds the pipeline from `config`, gated by `enabler`, exporting to
    /// `processor`.
    pub fn new(
        config: InstrumentationConfig,
        enabler: Arc<FeatureEnabler>,
        processor: impl SpanProcessor,
    ) -> Self {
        let metrics = DbClientMetrics::new(
            MetricsConfig::builder().namespace(config.metrics_namespace.as_str()).build(),
        );
        let instrumenter = build_mysql_instrumenter(&config, processor, metrics.clone());
        tracing::debug!(
            scope = %config.scope_name,
            enabled = enabler.is_enabled(),
            record_statement = config.record_statement,
            "mysql instrumentation initialized"
        );

        Self { hooks: Arc::new(DbHooks::new(Arc::new(instrumenter), enabler)), metrics }
    }

    /// Returns the process-wide instance.
    ///
    /// Configuration and the enabler come from the environment on first use;
    /// finished spans are logged through `tracing`.
    pub fn global() -> &'static MySqlInstrumentation {
        static GLOBAL: OnceLock<MySqlInstrumentation> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            Self::new(
                InstrumentationConfig::from_env(),
                FeatureEnabler::global(),
                TracingSpanProcessor,
            )
        })
    }

    /// Returns the hooks.
    pub fn hooks(&self) -> &Arc<DbHooks> {
        &self.hooks
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> &DbClientMetrics {
        &self.metrics
    }

    /// Wraps `dialer` so its dials and executes are traced.
    pub fn wrap<D: Dialer>(&self, dialer: D) -> InstrumentedDialer<D> {
        InstrumentedDialer::new(dialer, Arc::clone(&self.hooks))
    }
}
