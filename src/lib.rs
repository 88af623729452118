//! # dbtel
//!
//! Correlated trace spans and client metrics for database dial and execute
//! calls.
//!
//! Every dial and every execute made through an instrumented client
//! produces one span. Execute spans are children of the dial span of their
//! connection and carry the endpoint, namespace, reconstructed statement and
//! classified operation. Per-operation latency and outcome counters are
//! collected alongside.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dbtel::{client::DialParams, mysql::MySqlInstrumentation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tracing_subscriber::fmt::init();
//!
//!     // Wrap the driver's dialer once.
//!     let dialer = MySqlInstrumentation::global().wrap(my_driver::Dialer::new());
//!
//!     let params = DialParams::builder()
//!         .address("db.internal:3306")
//!         .user("app")
//!         .database("shop")
//!         .build();
//!     let mut conn = dialer.dial(&params).await?;
//!
//!     // Traced as a child of the dial span: "SELECT shop".
//!     conn.execute("SELECT * FROM orders WHERE id = ?", &[42.into()]).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **Entry/exit hooks**: [`correlation::DbHooks`] runs around each call; the
//!   pair is linked by a per-call [`correlation::CallSlot`]
//! - **Chaining**: a successful dial registers its span context under the
//!   connection's id; executes on that connection become its children
//! - **Best effort**: telemetry never fails or alters a database call
//!
//! ## Environment
//!
//! - `OTEL_INSTRUMENTATION_MYSQL_ENABLED=false` disables all hooks
//! - `OTEL_INSTRUMENTATION_MYSQL_STATEMENT_ENABLED=false` omits `db.statement`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod classifier;
pub mod config;
pub mod error;
pub mod request;
pub mod semconv;

// Span pipeline
pub mod instrumenter;
pub mod telemetry;

// Hooks and client decorator
pub mod client;
pub mod correlation;
pub mod mysql;

// Testing utilities
pub mod testing;

// Re-export main types at crate root for convenience
pub use classifier::classify_operation;
pub use client::{Connection, DialParams, Dialer, InstrumentedConnection, InstrumentedDialer};
pub use config::{FeatureEnabler, InstrumentationConfig};
pub use correlation::{CallSlot, ConnectionId, CorrelationError, DbHooks};
pub use error::{Error, ErrorKind, Result};
pub use mysql::MySqlInstrumentation;
pub use request::{DbRequest, DbResponse, DbValue, ExecResult};
