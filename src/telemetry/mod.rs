//! Telemetry primitives: trace context, spans, span processors and metrics.
//!
//! ## Features
//!
//! - W3C Trace Context identifiers and `traceparent` round-tripping
//! - Active and finished spans with typed attributes
//! - Pluggable span processors (discard, log via `tracing`, record in memory)
//! - Per-operation client metrics with a serializable snapshot
//!
//! ## Example
//!
//! ```rust,ignore
//! use tracing_subscriber::prelude::*;
//!
//! // Finished spans surface as `dbtel::span` events.
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .init();
//! ```

mod context;
mod metrics;
mod processor;
mod span;

pub use context::{SpanId, TraceContext, TraceContextError, TraceFlags, TraceId};
pub use metrics::{
    DIAL_OPERATION, DbClientMetrics, DbMetricsSnapshot, MetricsConfig, OperationSnapshot,
    UNKNOWN_OPERATION,
};
pub use processor::{InMemorySpanRecorder, NoopSpanProcessor, SpanProcessor, TracingSpanProcessor};
pub use span::{ActiveSpan, FinishedSpan, SpanKind, SpanStatus, SpanValue};
