//! Error kind enumeration for categorizing database client errors.

/// Categorization of errors raised by database clients and by the
/// instrumentation layer around them.
///
/// Only the kinds the instrumentation itself needs to reason about are
/// listed. Client errors that do not fit a category map to [`ErrorKind::Unknown`].
///
/// | ErrorKind       | Origin                          | Span status |
/// |-----------------|---------------------------------|-------------|
/// | `Connection`    | dial failed, socket dropped     | error       |
/// | `Timeout`       | dial or query deadline exceeded | error       |
/// | `Cancelled`     | call future dropped mid-flight  | error       |
/// | `Query`         | server rejected the command     | error       |
/// | `Protocol`      | malformed packet or response    | error       |
/// | `Configuration` | invalid environment or config   | n/a         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Connection error (DNS, TLS handshake, refused, reset).
    ///
    /// **Retriable.** May indicate transient network issues.
    #[error("connection error")]
    Connection,

    /// Dial or query timed out.
    ///
    /// **Retriable.**
    #[error("timeout")]
    Timeout,

    /// The call was cancelled before it completed.
    ///
    /// Raised by the instrumented wrappers when a dial or execute future is
    /// dropped before the inner client returned.
    #[error("cancelled")]
    Cancelled,

    /// The server rejected the command (syntax error, constraint violation).
    ///
    /// **Not retriable.** Fix the statement.
    #[error("query error")]
    Query,

    /// Protocol error (malformed packet, unexpected response).
    #[error("protocol error")]
    Protocol,

    /// Configuration error (invalid environment toggle, bad endpoint).
    #[error("configuration error")]
    Configuration,

    /// Internal error.
    #[error("internal error")]
    Internal,

    /// Unknown or unexpected error.
    #[error("unknown error")]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if this error kind is generally safe to retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use dbtel::ErrorKind;
    ///
    /// assert!(ErrorKind::Timeout.is_retriable());
    /// assert!(!ErrorKind::Query.is_retriable());
    /// ```
    #[inline]
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorKind::Connection | ErrorKind::Timeout)
    }

    /// Returns the value recorded as the `error.type` span attribute.
    #[inline]
    pub fn as_error_type(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Query => "query",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Internal => "internal",
            ErrorKind::Unknown => "_OTHER",
        }
    }
}
