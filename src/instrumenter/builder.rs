//! Builder for [`Instrumenter`].

use std::sync::Arc;

use super::{
    AlwaysClientExtractor, AttributesExtractor, InstrumentationScope, Instrumenter,
    OperationListener, SpanKindExtractor, SpanNameExtractor,
};
use crate::telemetry::{NoopSpanProcessor, SpanProcessor};

/// Assembles an [`Instrumenter`] from its extractors, listeners and span
/// processor.
///
/// Only the span name extractor is required; everything else has a
/// default (client spans, the crate's own scope, no attributes, no
/// listeners, spans discarded).
///
/// ## Example
///
/// ```rust
/// use dbtel::{
///     DbRequest, DbResponse,
///     instrumenter::{Instrumenter, InstrumentationScope},
///     telemetry::InMemorySpanRecorder,
/// };
///
/// let recorder = InMemorySpanRecorder::new();
/// let instrumenter = Instrumenter::<DbRequest, DbResponse>::builder(|r: &DbRequest| {
///     r.command().to_owned()
/// })
/// .instrumentation_scope(InstrumentationScope::new("demo"))
/// .span_processor(recorder.clone())
/// .build();
///
/// let request = DbRequest::builder().command("PING").build();
/// let span = instrumenter.start(None, &request);
/// instrumenter.end(span, &request, None, None);
/// assert_eq!(recorder.spans_named("PING").len(), 1);
/// ```
pub struct InstrumenterBuilder<R, Resp> {
    span_name_extractor: Box<dyn SpanNameExtractor<R>>,
    span_kind_extractor: Box<dyn SpanKindExtractor<R>>,
    scope: InstrumentationScope,
    attributes_extractors: Vec<Box<dyn AttributesExtractor<R, Resp>>>,
    operation_listeners: Vec<Arc<dyn OperationListener<R>>>,
    processor: Arc<dyn SpanProcessor>,
}

impl<R: 'static, Resp: 'static> InstrumenterBuilder<R, Resp> {
    pub(super) fn new(span_name_extractor: impl SpanNameExtractor<R>) -> Self {
        Self {
            span_name_extractor: Box::new(span_name_extractor),
            span_kind_extractor: Box::new(AlwaysClientExtractor),
            scope: InstrumentationScope::default(),
            attributes_extractors: Vec::new(),
            operation_listeners: Vec::new(),
            processor: Arc::new(NoopSpanProcessor),
        }
    }

    /// Replaces the span name extractor.
    #[must_use]
    pub fn span_name_extractor(mut self, extractor: impl SpanNameExtractor<R>) -> Self {
        self.span_name_extractor = Box::new(extractor);
        self
    }

    /// Sets the span kind extractor.
    #[must_use]
    pub fn span_kind_extractor(mut self, extractor: impl SpanKindExtractor<R>) -> Self {
        self.span_kind_extractor = Box::new(extractor);
        self
    }

    /// Sets the instrumentation scope stamped on every span.
    #[must_use]
    pub fn instrumentation_scope(mut self, scope: InstrumentationScope) -> Self {
        self.scope = scope;
        self
    }

    /// Appends an attributes extractor. Extractors run in insertion order.
    #[must_use]
    pub fn add_attributes_extractor(mut self, extractor: impl AttributesExtractor<R, Resp>) -> Self {
        self.attributes_extractors.push(Box::new(extractor));
        self
    }

    /// Appends an operation listener. Listeners run in insertion order.
    #[must_use]
    pub fn add_operation_listener(mut self, listener: Arc<dyn OperationListener<R>>) -> Self {
        self.operation_listeners.push(listener);
        self
    }

    /// Sets the processor receiving finished spans.
    #[must_use]
    pub fn span_processor(mut self, processor: impl SpanProcessor) -> Self {
        self.processor = Arc::new(processor);
        self
    }

    /// Builds the instrumenter.
    pub fn build(self) -> Instrumenter<R, Resp> {
        Instrumenter {
            span_name_extractor: self.span_name_extractor,
            span_kind_extractor: self.span_kind_extractor,
            scope: self.scope,
            attributes_extractors: self.attributes_extractors,
            operation_listeners: self.operation_listeners,
            processor: self.processor,
        }
    }
}

impl<R, Resp> std::fmt::Debug for InstrumenterBuilder<R, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumenterBuilder")
            .field("scope", &self.scope)
            .field("attributes_extractors", &self.attributes_extractors.len())
            .field("operation_listeners", &self.operation_listeners.len())
            .finish_non_exhaustive()
    }
}
