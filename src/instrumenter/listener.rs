//! Operation listeners: side channels notified around every instrumented call.

use crate::telemetry::{ActiveSpan, SpanStatus};

/// Observes the start and end of every operation, typically to record
/// metrics.
///
/// Listeners see the span as it stands, after attribute extraction and
/// before export.
pub trait OperationListener<R>: Send + Sync + 'static {
    /// Called once the span has started.
    fn on_start(&self, span: &ActiveSpan, request: &R);

    /// Called just before the span is handed to the processor.
    fn on_end(&self, span: &ActiveSpan, request: &R, status: &SpanStatus);

    /// Called when a started span is discarded without ending.
    ///
    /// Listeners that count work in `on_start` release it here.
    fn on_abandon(&self, _span: &ActiveSpan, _request: &R) {}
}
