//! Extractor seams: span naming, span kind and attribute population.

use std::{error::Error as StdError, marker::PhantomData};

use crate::{
    semconv::DbClientAttributesGetter,
    telemetry::{ActiveSpan, SpanKind, TraceContext},
};

/// Derives a span name from a request.
pub trait SpanNameExtractor<R>: Send + Sync + 'static {
    /// Returns the span name for `request`.
    fn extract(&self, request: &R) -> String;
}

impl<R, F> SpanNameExtractor<R> for F
where
    F: Fn(&R) -> String + Send + Sync + 'static,
{
    fn extract(&self, request: &R) -> String {
        self(request)
    }
}

/// Derives a span kind from a request.
pub trait SpanKindExtractor<R>: Send + Sync + 'static {
    /// Returns the span kind for `request`.
    fn extract(&self, request: &R) -> SpanKind;
}

/// Reports every span as [`SpanKind::Client`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysClientExtractor;

impl<R> SpanKindExtractor<R> for AlwaysClientExtractor {
    fn extract(&self, _request: &R) -> SpanKind {
        SpanKind::Client
    }
}

/// Writes attributes onto a span at start and at end.
pub trait AttributesExtractor<R, Resp>: Send + Sync + 'static {
    /// Called after the span starts, with the start view of the request.
    fn on_start(&self, span: &mut ActiveSpan, parent: Option<&TraceContext>, request: &R);

    /// Called before the span ends, with the end view and the outcome.
    fn on_end(
        &self,
        span: &mut ActiveSpan,
        request: &R,
        response: Option<&Resp>,
        error: Option<&(dyn StdError + 'static)>,
    );
}

/// Names database spans from the operation and namespace.
///
/// The name is `"{operation} {namespace}"` when both are non-empty, either
/// one alone when only it is present, and `"DB Query"` otherwise.
#[derive(Debug, Clone)]
pub struct DbSpanNameExtractor<G, R> {
    getter: G,
    _request: PhantomData<fn(&R)>,
}

impl<G, R> DbSpanNameExtractor<G, R> {
    /// Creates a name extractor reading through `getter`.
    pub fn new(getter: G) -> Self {
        Self { getter, _request: PhantomData }
    }
}

impl<G, R> SpanNameExtractor<R> for DbSpanNameExtractor<G, R>
where
    G: DbClientAttributesGetter<R>,
    R: 'static,
{
    fn extract(&self, request: &R) -> String {
        let operation = self.getter.operation(request).unwrap_or_default();
        let namespace = self.getter.namespace(request);
        match (operation.is_empty(), namespace.is_empty()) {
            (false, false) => format!("{operation} {namespace}"),
            (false, true) => operation.to_owned(),
            (true, false) => namespace.to_owned(),
            (true, true) => "DB Query".to_owned(),
        }
    }
}

/// Name and version of the library producing spans.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct InstrumentationScope {
    /// Scope name, e.g. `dbtel.mysql`.
    #[builder(into)]
    pub name: String,
    /// Scope version.
    #[builder(into, default = env!("CARGO_PKG_VERSION").to_string())]
    pub version: String,
}

impl InstrumentationScope {
    /// Creates a scope tagged with this crate's version.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }
}

impl Default for InstrumentationScope {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}
