//! The instrumenter: starts and ends spans for a request type.
//!
//! An [`Instrumenter`] is assembled once from a span name extractor, a span
//! kind extractor, any number of [`AttributesExtractor`]s and
//! [`OperationListener`]s, and a [`SpanProcessor`](crate::telemetry::SpanProcessor).
//! It is then shared (behind an `Arc`) by every call it instruments.
//!
//! The lifecycle of one call is:
//!
//! 1. [`Instrumenter::start`] names the span, derives its context from the
//!    parent, stamps the instrumentation scope, runs every extractor's
//!    `on_start` and every listener's `on_start`.
//! 2. [`Instrumenter::end`] runs every extractor's `on_end`, every
//!    listener's `on_end`, sets the status from the error (if any) and
//!    hands the finished span to the processor.
//!
//! A started span that will never end goes to [`Instrumenter::abandon`]
//! instead, which only notifies the listeners.

mod builder;
mod extractor;
mod listener;

use std::{error::Error as StdError, sync::Arc};

pub use builder::InstrumenterBuilder;
pub use extractor::{
    AlwaysClientExtractor, AttributesExtractor, DbSpanNameExtractor, InstrumentationScope,
    SpanKindExtractor, SpanNameExtractor,
};
pub use listener::OperationListener;

use crate::{
    semconv::attribute_keys::{OTEL_SCOPE_NAME, OTEL_SCOPE_VERSION},
    telemetry::{ActiveSpan, SpanProcessor, SpanStatus, TraceContext},
};

/// Produces spans for requests of type `R` answered by `Resp`.
pub struct Instrumenter<R, Resp> {
    span_name_extractor: Box<dyn SpanNameExtractor<R>>,
    span_kind_extractor: Box<dyn SpanKindExtractor<R>>,
    scope: InstrumentationScope,
    attributes_extractors: Vec<Box<dyn AttributesExtractor<R, Resp>>>,
    operation_listeners: Vec<Arc<dyn OperationListener<R>>>,
    processor: Arc<dyn SpanProcessor>,
}

impl<R: 'static, Resp: 'static> Instrumenter<R, Resp> {
    /// Starts building an instrumenter around `span_name_extractor`.
    pub fn builder(span_name_extractor: impl SpanNameExtractor<R>) -> InstrumenterBuilder<R, Resp> {
        InstrumenterBuilder::new(span_name_extractor)
    }

    /// Returns the instrumentation scope.
    pub fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }

    /// Starts a span for `request`.
    ///
    /// The span is a child of `parent` when one is given and a new root
    /// otherwise.
    pub fn start(&self, parent: Option<&TraceContext>, request: &R) -> ActiveSpan {
        let name = self.span_name_extractor.extract(request);
        let kind = self.span_kind_extractor.extract(request);
        let mut span = ActiveSpan::start(name, kind, TraceContext::child_of(parent));

        span.set_attribute(OTEL_SCOPE_NAME, self.scope.name.as_str());
        span.set_attribute(OTEL_SCOPE_VERSION, self.scope.version.as_str());

        for extractor in &self.attributes_extractors {
            extractor.on_start(&mut span, parent, request);
        }
        for listener in &self.operation_listeners {
            listener.on_start(&span, request);
        }

        span
    }

    /// Ends `span` with the outcome of the call and exports it.
    ///
    /// A present `error` marks the span failed with the error's message.
    pub fn end(
        &self,
        mut span: ActiveSpan,
        request: &R,
        response: Option<&Resp>,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        for extractor in &self.attributes_extractors {
            extractor.on_end(&mut span, request, response, error);
        }

        let status = match error {
            Some(error) => SpanStatus::Error(error.to_string()),
            None => SpanStatus::Ok,
        };
        for listener in &self.operation_listeners {
            listener.on_end(&span, request, &status);
        }

        self.processor.on_end(span.finish(status));
    }

    /// Discards a started `span` without exporting it.
    ///
    /// Listeners are told through [`OperationListener::on_abandon`] so that
    /// anything counted at start is released.
    pub fn abandon(&self, span: ActiveSpan, request: &R) {
        for listener in &self.operation_listeners {
            listener.on_abandon(&span, request);
        }
    }
}

impl<R, Resp> std::fmt::Debug for Instrumenter<R, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumenter")
            .field("scope", &self.scope)
            .field("attributes_extractors", &self.attributes_extractors.len())
            .field("operation_listeners", &self.operation_listeners.len())
            .finish_non_exhaustive()
    }
}
