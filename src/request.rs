//! The request model: one immutable value per view of a database call.
//!
//! An entry hook builds a *start view* of the call and an exit hook builds a
//! separate *end view*; the two may differ (the end view knows the outcome
//! and the namespace resolved from the live connection).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::telemetry::TraceContext;

/// One database operation as seen by the instrumentation pipeline.
///
/// ## Example
///
/// ```rust
/// use dbtel::{DbRequest, DbValue};
///
/// let request = DbRequest::builder()
///     .endpoint("db.internal:3306")
///     .namespace("shop")
///     .command("SELECT * FROM orders WHERE id = ?")
///     .operation("SELECT")
///     .arguments(vec![DbValue::from(42)])
///     .build();
///
/// assert_eq!(request.operation(), Some("SELECT"));
/// assert_eq!(request.arguments().len(), 1);
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct DbRequest {
    /// Coarse operation verb; `None` until classified (dials never are).
    #[builder(into)]
    operation: Option<String>,

    /// Positional arguments bound to the command's placeholders.
    #[builder(default)]
    arguments: Vec<DbValue>,

    /// Server address as `host:port`.
    #[builder(into, default)]
    endpoint: String,

    /// Raw command text.
    #[builder(into, default)]
    command: String,

    /// Database (schema) the call runs against.
    #[builder(into, default)]
    namespace: String,

    /// Causal context of the call, when known.
    context: Option<TraceContext>,

    /// Wall-clock time the view was built.
    #[builder(default = Utc::now())]
    started_at: DateTime<Utc>,
}

impl DbRequest {
    /// Returns the classified operation, if any.
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Returns the positional arguments.
    pub fn arguments(&self) -> &[DbValue] {
        &self.arguments
    }

    /// Returns the server endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the raw command text.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the database namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the causal context, if set.
    pub fn context(&self) -> Option<&TraceContext> {
        self.context.as_ref()
    }

    /// Returns when this view was built.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// An opaque positional argument passed alongside a command.
///
/// Its [`Display`](fmt::Display) output is the string form spliced into
/// reconstructed statements: `NULL` for null, `0x`-prefixed lowercase hex
/// for bytes, the natural rendering otherwise. Text is not quoted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum DbValue {
    /// SQL `NULL`.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
}

impl DbValue {
    /// Returns `true` if this is `NULL`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbValue::Null => f.write_str("NULL"),
            DbValue::Bool(b) => write!(f, "{}", b),
            DbValue::Int(i) => write!(f, "{}", i),
            DbValue::UInt(u) => write!(f, "{}", u),
            DbValue::Float(v) => write!(f, "{}", v),
            DbValue::Text(s) => f.write_str(s),
            DbValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}

impl From<bool> for DbValue {
    fn from(value: bool) -> Self {
        DbValue::Bool(value)
    }
}

impl From<i32> for DbValue {
    fn from(value: i32) -> Self {
        DbValue::Int(i64::from(value))
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        DbValue::Int(value)
    }
}

impl From<u32> for DbValue {
    fn from(value: u32) -> Self {
        DbValue::UInt(u64::from(value))
    }
}

impl From<u64> for DbValue {
    fn from(value: u64) -> Self {
        DbValue::UInt(value)
    }
}

impl From<f64> for DbValue {
    fn from(value: f64) -> Self {
        DbValue::Float(value)
    }
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        DbValue::Text(value.to_owned())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        DbValue::Text(value)
    }
}

impl From<Vec<u8>> for DbValue {
    fn from(value: Vec<u8>) -> Self {
        DbValue::Bytes(value)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(DbValue::Null, Into::into)
    }
}

/// Outcome summary of a successful execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExecResult {
    /// Rows changed by the statement.
    pub affected_rows: u64,
    /// Auto-increment id generated by the statement, `0` if none.
    pub last_insert_id: u64,
    /// Rows returned to the client.
    pub returned_rows: u64,
}

impl ExecResult {
    /// Creates a result reporting `affected_rows` changed rows.
    pub fn affected(affected_rows: u64) -> Self {
        Self { affected_rows, ..Self::default() }
    }

    /// Creates a result reporting `returned_rows` rows read.
    pub fn rows(returned_rows: u64) -> Self {
        Self { returned_rows, ..Self::default() }
    }
}

/// The response view handed to the instrumenter on `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbResponse {
    /// A dial established a connection.
    Connected,
    /// An execute call completed.
    Executed(ExecResult),
}
