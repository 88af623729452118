//! Span processors: where finished spans leave the instrumentation pipeline.
//!
//! Exporting over a wire protocol belongs to the tracing SDK sitting behind
//! a [`SpanProcessor`]. Implementations must not block: `on_end` runs inline
//! on the thread that issued the database call.

use std::sync::Arc;

use parking_lot::Mutex;

use super::span::FinishedSpan;

/// Receives every span the instrumenter finishes.
pub trait SpanProcessor: Send + Sync + 'static {
    /// Called once per finished span.
    fn on_end(&self, span: FinishedSpan);
}

impl<P: SpanProcessor + ?Sized> SpanProcessor for Arc<P> {
    fn on_end(&self, span: FinishedSpan) {
        (**self).on_end(span);
    }
}

/// Discards every span.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpanProcessor;

impl SpanProcessor for NoopSpanProcessor {
    fn on_end(&self, _span: FinishedSpan) {}
}

/// Emits one `tracing` event per finished span.
///
/// Events are logged at `INFO` under the `dbtel::span` target with the span
/// attributes JSON-encoded, so any `tracing-subscriber` setup (or an
/// OpenTelemetry layer) can pick them up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSpanProcessor;

impl SpanProcessor for TracingSpanProcessor {
    fn on_end(&self, span: FinishedSpan) {
        let attributes: serde_json::Map<String, serde_json::Value> = span
            .attributes()
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(serde_json::Value::Null)))
            .collect();
        let attributes = serde_json::Value::Object(attributes).to_string();
        let parent = span.context().parent_span_id().map(ToString::to_string).unwrap_or_default();

        tracing::info!(
            target: "dbtel::span",
            name = span.name(),
            kind = %span.kind(),
            trace_id = %span.context().trace_id(),
            span_id = %span.context().span_id(),
            parent_span_id = %parent,
            duration_us = u64::try_from(span.duration().as_micros()).unwrap_or(u64::MAX),
            status = %span.status(),
            attributes = %attributes,
            "span finished"
        );
    }
}

/// Records finished spans in memory.
///
/// Cloning shares the underlying buffer, so a clone can be handed to the
/// instrumenter while the original is kept for assertions.
///
/// ## Example
///
/// ```rust
/// use dbtel::telemetry::{InMemorySpanRecorder, SpanProcessor};
///
/// let recorder = InMemorySpanRecorder::new();
/// assert!(recorder.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySpanRecorder {
    spans: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl InMemorySpanRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every span recorded so far, in finish order.
    pub fn spans(&self) -> Vec<FinishedSpan> {
        self.spans.lock().clone()
    }

    /// Returns the recorded spans whose name matches.
    pub fn spans_named(&self, name: &str) -> Vec<FinishedSpan> {
        self.spans.lock().iter().filter(|s| s.name() == name).cloned().collect()
    }

    /// Returns the number of recorded spans.
    pub fn len(&self) -> usize {
        self.spans.lock().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.spans.lock().is_empty()
    }

    /// Removes and returns every recorded span.
    pub fn drain(&self) -> Vec<FinishedSpan> {
        std::mem::take(&mut *self.spans.lock())
    }
}

impl SpanProcessor for InMemorySpanRecorder {
    fn on_end(&self, span: FinishedSpan) {
        self.spans.lock().push(span);
    }
}
