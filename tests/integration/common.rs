//! Common test harness for dbtel integration tests.

use std::sync::{Arc, Once};

use anyhow::Result;
use dbtel::{
    DialParams, InstrumentedConnection, InstrumentedDialer, MySqlInstrumentation,
    config::{FeatureEnabler, InstrumentationConfig},
    telemetry::{FinishedSpan, InMemorySpanRecorder},
    testing::{MemoryConnection, MemoryDatabase},
};

static TRACING: Once = Once::new();

/// Installs a test-friendly `tracing` subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An instrumented in-memory database with its own enabler and recorder.
pub struct Harness {
    pub instrumentation: MySqlInstrumentation,
    pub enabler: Arc<FeatureEnabler>,
    pub recorder: InMemorySpanRecorder,
    pub db: MemoryDatabase,
    pub dialer: InstrumentedDialer<MemoryDatabase>,
}

impl Harness {
    /// Creates a harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(InstrumentationConfig::default())
    }

    /// Creates a harness with `config`.
    pub fn with_config(config: InstrumentationConfig) -> Self {
        Self::with_database(config, MemoryDatabase::new())
    }

    /// Creates a harness with `config` around a prepared `db`.
    pub fn with_database(config: InstrumentationConfig, db: MemoryDatabase) -> Self {
        init_tracing();

        let enabler = Arc::new(FeatureEnabler::default());
        let recorder = InMemorySpanRecorder::new();
        let instrumentation =
            MySqlInstrumentation::new(config, Arc::clone(&enabler), recorder.clone());
        let dialer = instrumentation.wrap(db.clone());

        Self { instrumentation, enabler, recorder, db, dialer }
    }

    /// Dials `address`, selecting `database`.
    pub async fn dial(
        &self,
        address: &str,
        database: &str,
    ) -> Result<InstrumentedConnection<MemoryConnection>> {
        Ok(self.dialer.dial(&params(address, database)).await?)
    }

    /// Returns the recorded spans whose `key` attribute equals `value`.
    pub fn spans_where(&self, key: &str, value: &str) -> Vec<FinishedSpan> {
        self.recorder.spans().into_iter().filter(|s| s.str_attribute(key) == Some(value)).collect()
    }
}

/// Builds dial parameters for the test user.
pub fn params(address: &str, database: &str) -> DialParams {
    DialParams::builder()
        .address(address)
        .user("app")
        .password("secret")
        .database(database)
        .build()
}
