//! Integration tests for dbtel.
//!
//! These tests drive the instrumented client decorator end to end against
//! the in-memory database and assert on the spans and metrics it produces.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//!
//! # With hook logging
//! RUST_LOG=dbtel=debug cargo test --test integration -- --nocapture
//! ```

mod cancellation_tests;
mod chaining_tests;
mod common;
mod concurrency_tests;
mod end_to_end_tests;
