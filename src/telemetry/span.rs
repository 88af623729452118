//! Span types: in-flight and finished spans plus their attribute values.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::telemetry::TraceContext;

/// Kind of span, indicating its role in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// A client-side span (outgoing request).
    #[default]
    Client,
    /// A server-side span (incoming request).
    Server,
    /// An internal span.
    Internal,
}

impl SpanKind {
    /// Returns the OpenTelemetry span kind value.
    pub fn otel_value(&self) -> i32 {
        match self {
            SpanKind::Client => 3,
            SpanKind::Server => 2,
            SpanKind::Internal => 1,
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanKind::Client => write!(f, "client"),
            SpanKind::Server => write!(f, "server"),
            SpanKind::Internal => write!(f, "internal"),
        }
    }
}

/// Status of a span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanStatus {
    /// Span completed successfully.
    Ok,
    /// Span completed with an error.
    Error(String),
    /// Span status is unset.
    #[default]
    Unset,
}

impl SpanStatus {
    /// Returns `true` if the span status is Ok.
    pub fn is_ok(&self) -> bool {
        matches!(self, SpanStatus::Ok)
    }

    /// Returns `true` if the span status is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, SpanStatus::Error(_))
    }

    /// Returns the error message if this is an error status.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SpanStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanStatus::Ok => write!(f, "ok"),
            SpanStatus::Error(msg) => write!(f, "error: {}", msg),
            SpanStatus::Unset => write!(f, "unset"),
        }
    }
}

/// A span that has been started but not yet ended.
///
/// Returned by [`Instrumenter::start`](crate::instrumenter::Instrumenter::start)
/// and consumed by [`Instrumenter::end`](crate::instrumenter::Instrumenter::end),
/// so a span can be ended at most once.
#[derive(Debug)]
pub struct ActiveSpan {
    name: String,
    kind: SpanKind,
    context: TraceContext,
    attributes: Vec<(String, SpanValue)>,
    started_at: Instant,
    start_time: DateTime<Utc>,
}

impl ActiveSpan {
    /// Starts a span with the given name, kind and context.
    pub fn start(name: impl Into<String>, kind: SpanKind, context: TraceContext) -> Self {
        Self {
            name: name.into(),
            kind,
            context,
            attributes: Vec::new(),
            started_at: Instant::now(),
            start_time: Utc::now(),
        }
    }

    /// Returns the span name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the span kind.
    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// Returns the causal context of this span.
    ///
    /// Children started with this context as parent join the same trace.
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    /// Returns the span attributes.
    pub fn attributes(&self) -> &[(String, SpanValue)] {
        &self.attributes
    }

    /// Returns a single attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&SpanValue> {
        find_attribute(&self.attributes, key)
    }

    /// Sets an attribute, replacing any previous value under the same key.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<SpanValue>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Returns the monotonic instant the span started at.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the span started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Finishes the span with the given status.
    pub fn finish(self, status: SpanStatus) -> FinishedSpan {
        FinishedSpan {
            name: self.name,
            kind: self.kind,
            context: self.context,
            attributes: self.attributes,
            start_time: self.start_time,
            duration: self.started_at.elapsed(),
            status,
        }
    }
}

/// A finished span with timing information, ready for export.
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    name: String,
    kind: SpanKind,
    context: TraceContext,
    attributes: Vec<(String, SpanValue)>,
    start_time: DateTime<Utc>,
    duration: Duration,
    status: SpanStatus,
}

impl FinishedSpan {
    /// Returns the span name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the span kind.
    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// Returns the trace context of the span.
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    /// Returns the span attributes.
    pub fn attributes(&self) -> &[(String, SpanValue)] {
        &self.attributes
    }

    /// Returns a single attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&SpanValue> {
        find_attribute(&self.attributes, key)
    }

    /// Returns a string attribute by key.
    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(SpanValue::as_str)
    }

    /// Returns the wall-clock start time.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Returns the span duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the span status.
    pub fn status(&self) -> &SpanStatus {
        &self.status
    }

    /// Returns `true` if the span completed successfully.
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Returns `true` if the span completed with an error.
    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }
}

fn find_attribute<'a>(attributes: &'a [(String, SpanValue)], key: &str) -> Option<&'a SpanValue> {
    attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// A value that can be attached to a span as an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpanValue {
    /// A string value.
    String(String),
    /// An integer value.
    Int(i64),
    /// A float value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// An array of strings.
    StringArray(Vec<String>),
}

impl SpanValue {
    /// Returns the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpanValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SpanValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SpanValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SpanValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpanValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanValue::String(s) => write!(f, "{}", s),
            SpanValue::Int(i) => write!(f, "{}", i),
            SpanValue::Float(fl) => write!(f, "{}", fl),
            SpanValue::Bool(b) => write!(f, "{}", b),
            SpanValue::StringArray(arr) => write!(f, "{:?}", arr),
        }
    }
}

impl From<&str> for SpanValue {
    fn from(s: &str) -> Self {
        SpanValue::String(s.to_string())
    }
}

impl From<String> for SpanValue {
    fn from(s: String) -> Self {
        SpanValue::String(s)
    }
}

impl From<i64> for SpanValue {
    fn from(i: i64) -> Self {
        SpanValue::Int(i)
    }
}

impl From<u16> for SpanValue {
    fn from(i: u16) -> Self {
        SpanValue::Int(i64::from(i))
    }
}

impl From<u64> for SpanValue {
    fn from(i: u64) -> Self {
        SpanValue::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<usize> for SpanValue {
    fn from(i: usize) -> Self {
        SpanValue::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for SpanValue {
    fn from(f: f64) -> Self {
        SpanValue::Float(f)
    }
}

impl From<bool> for SpanValue {
    fn from(b: bool) -> Self {
        SpanValue::Bool(b)
    }
}

impl From<Vec<String>> for SpanValue {
    fn from(arr: Vec<String>) -> Self {
        SpanValue::StringArray(arr)
    }
}
