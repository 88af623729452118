//! Testing utilities.
//!
//! - [`MemoryDatabase`]: a scripted in-memory [`Dialer`](crate::client::Dialer)
//! - [`MemoryConnection`]: its [`Connection`](crate::client::Connection)
//! - [`InMemorySpanRecorder`]: a span processor that keeps finished spans
//!
//! ## Quick Start
//!
//! ```rust
//! use dbtel::testing::{InMemorySpanRecorder, MemoryDatabase};
//!
//! let recorder = InMemorySpanRecorder::new();
//! let db = MemoryDatabase::new().with_default_database("shop");
//! assert!(recorder.is_empty());
//! ```

mod memory;

pub use memory::{MemoryConnection, MemoryDatabase};

pub use crate::telemetry::InMemorySpanRecorder;
