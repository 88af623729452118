//! Error types for `dbtel`.
//!
//! - [`Error`]: errors of the bundled in-memory client and configuration layer
//! - [`ErrorKind`]: categorization used for span `error.type` attributes
//!
//! ## Key Invariant
//!
//! Instrumentation never produces an application-visible error. A wrapped
//! client's own error type is passed through unchanged; internal correlation
//! failures are logged and swallowed (see
//! [`CorrelationError`](crate::correlation::CorrelationError)).

mod core;
mod kind;

pub use self::core::Error;
pub use self::kind::ErrorKind;

/// A specialized `Result` type for `dbtel` operations.
pub type Result<T> = std::result::Result<T, Error>;
