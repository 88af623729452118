//! Main error type for database clients driven through `dbtel`.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use super::ErrorKind;

/// The error type used by the in-memory test client, the configuration
/// layer, and the cancellation outcome recorded by the instrumented wrappers.
///
/// Errors produced by a wrapped client are never converted into this type:
/// the wrappers hand the client's own error back to the caller untouched.
///
/// ```text
/// Error
/// ├── kind: ErrorKind          (category for matching)
/// ├── message: String          (human-readable description)
/// └── source: Option           (underlying cause)
/// ```
///
/// ## Example
///
/// ```rust
/// use dbtel::{Error, ErrorKind};
///
/// let err = Error::query("Table 'shop.orders' doesn't exist");
/// assert_eq!(err.kind(), ErrorKind::Query);
/// assert!(!err.is_retriable());
/// ```
#[derive(Debug)]
pub struct Error {
    /// The error category.
    kind: ErrorKind,

    /// Human-readable error message.
    message: Cow<'static, str>,

    /// The underlying error, if any.
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    /// Creates an error from a kind with a default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::Connection => "connection failed",
            ErrorKind::Timeout => "operation timed out",
            ErrorKind::Cancelled => "call cancelled before completion",
            ErrorKind::Query => "query rejected",
            ErrorKind::Protocol => "protocol error",
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Internal => "internal error",
            ErrorKind::Unknown => "unknown error",
        };
        Self::new(kind, message)
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message without the kind prefix.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error is generally safe to retry.
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors for common error types

    /// Creates a connection error.
    pub fn connection(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates a cancelled error.
    pub fn cancelled() -> Self {
        Self::from_kind(ErrorKind::Cancelled)
    }

    /// Creates a query error.
    pub fn query(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Query, message)
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for Error {
    /// Clones kind and message; the source chain is not cloneable and is dropped.
    fn clone(&self) -> Self {
        Self { kind: self.kind, message: self.message.clone(), source: None }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe => ErrorKind::Connection,
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
                ErrorKind::Protocol
            },
            _ => ErrorKind::Internal,
        };
        Error::new(kind, err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_new() {
        let err = Error::new(ErrorKind::Query, "syntax error near 'FORM'");
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(err.message(), "syntax error near 'FORM'");
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_error_from_kind() {
        let err = Error::from_kind(ErrorKind::Cancelled);
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn test_error_with_source() {
        let io_err = std::io::Error::other("underlying error");
        let err = Error::connection("dial failed").with_source(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_clone_drops_source() {
        let err = Error::connection("dial failed").with_source(std::io::Error::other("reset"));
        let cloned = err.clone();
        assert_eq!(cloned.kind(), ErrorKind::Connection);
        assert_eq!(cloned.message(), "dial failed");
        assert!(cloned.source().is_none());
    }

    #[test]
    fn test_convenience_constructors() {
        assert_eq!(Error::connection("x").kind(), ErrorKind::Connection);
        assert_eq!(Error::timeout("x").kind(), ErrorKind::Timeout);
        assert_eq!(Error::cancelled().kind(), ErrorKind::Cancelled);
        assert_eq!(Error::query("x").kind(), ErrorKind::Query);
        assert_eq!(Error::protocol("x").kind(), ErrorKind::Protocol);
        assert_eq!(Error::configuration("x").kind(), ErrorKind::Configuration);
        assert_eq!(Error::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out").into();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err: Error =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_display_format() {
        let err = Error::timeout("read deadline of 5s exceeded");
        assert_eq!(err.to_string(), "timeout: read deadline of 5s exceeded");
    }
}
