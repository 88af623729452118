//! Configuration types for the instrumentation.
//!
//! This module provides:
//! - [`FeatureEnabler`]: Process-wide on/off switch read from the environment
//! - [`InstrumentationConfig`]: Span and metrics pipeline settings
//!
//! Metrics settings live in [`MetricsConfig`](crate::telemetry::MetricsConfig).

mod enabler;
mod instrumentation;

pub use enabler::{ENABLED_ENV, FeatureEnabler};
pub use instrumentation::{InstrumentationConfig, STATEMENT_ENABLED_ENV};
