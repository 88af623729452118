//! In-memory database client for exercising the instrumentation without a
//! server.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;

use crate::{
    Error,
    client::{Connection, DialParams, Dialer},
    request::{DbValue, ExecResult},
};

/// A scripted in-memory database implementing [`Dialer`].
///
/// Results are scripted per command prefix; the first matching script
/// wins and unmatched commands succeed with an empty result. One-shot
/// failures can be queued for the next dial or execute, and an execute
/// delay makes calls slow enough to cancel.
///
/// Cloning shares all state.
///
/// ## Example
///
/// ```rust
/// use dbtel::{ExecResult, testing::MemoryDatabase};
///
/// let db = MemoryDatabase::new()
///     .with_result("INSERT", ExecResult::affected(1))
///     .with_default_database("shop");
/// assert_eq!(db.dial_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    default_database: Mutex<String>,
    scripts: Mutex<Vec<(String, Result<ExecResult, Error>)>>,
    dial_failure: Mutex<Option<Error>>,
    execute_failure: Mutex<Option<Error>>,
    execute_delay: Mutex<Option<Duration>>,
    executed: Mutex<Vec<String>>,
    dial_count: AtomicU64,
    execute_count: AtomicU64,
}

impl MemoryDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database used when a dial does not name one.
    #[must_use]
    pub fn with_default_database(self, database: impl Into<String>) -> Self {
        *self.inner.default_database.lock() = database.into();
        self
    }

    /// Scripts a successful result for commands starting with `prefix`.
    #[must_use]
    pub fn with_result(self, prefix: impl Into<String>, result: ExecResult) -> Self {
        self.inner.scripts.lock().push((prefix.into(), Ok(result)));
        self
    }

    /// Scripts a failure for commands starting with `prefix`.
    #[must_use]
    pub fn with_error(self, prefix: impl Into<String>, error: Error) -> Self {
        self.inner.scripts.lock().push((prefix.into(), Err(error)));
        self
    }

    /// Makes the next dial fail with `error`.
    pub fn fail_next_dial(&self, error: Error) {
        *self.inner.dial_failure.lock() = Some(error);
    }

    /// Makes the next execute fail with `error`.
    pub fn fail_next_execute(&self, error: Error) {
        *self.inner.execute_failure.lock() = Some(error);
    }

    /// Delays every subsequent execute by `delay`.
    pub fn set_execute_delay(&self, delay: Option<Duration>) {
        *self.inner.execute_delay.lock() = delay;
    }

    /// Returns the number of dials attempted.
    pub fn dial_count(&self) -> u64 {
        self.inner.dial_count.load(Ordering::Relaxed)
    }

    /// Returns the number of executes attempted.
    pub fn execute_count(&self) -> u64 {
        self.inner.execute_count.load(Ordering::Relaxed)
    }

    /// Returns every command received, in arrival order.
    pub fn executed(&self) -> Vec<String> {
        self.inner.executed.lock().clone()
    }

    fn scripted(&self, command: &str) -> Result<ExecResult, Error> {
        self.inner
            .scripts
            .lock()
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map_or(Ok(ExecResult::default()), |(_, result)| result.clone())
    }
}

impl Dialer for MemoryDatabase {
    type Connection = MemoryConnection;
    type Error = Error;

    fn dial(
        &self,
        params: &DialParams,
    ) -> impl Future<Output = Result<MemoryConnection, Error>> + Send {
        let db = self.clone();
        let address = params.address().to_owned();
        let database = match params.database() {
            "" => self.inner.default_database.lock().clone(),
            name => name.to_owned(),
        };

        async move {
            db.inner.dial_count.fetch_add(1, Ordering::Relaxed);
            let failure = db.inner.dial_failure.lock().take();
            if let Some(err) = failure {
                return Err(err);
            }
            Ok(MemoryConnection { db, address, database })
        }
    }
}

/// A connection to a [`MemoryDatabase`].
///
/// `USE <name>` switches the current database.
#[derive(Debug)]
pub struct MemoryConnection {
    db: MemoryDatabase,
    address: String,
    database: String,
}

impl MemoryConnection {
    /// Returns the address this connection was dialed with.
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Returns the target of a `USE <name>` command.
fn use_target(command: &str) -> Option<&str> {
    let mut tokens = command.split_whitespace();
    let verb = tokens.next()?;
    if !verb.eq_ignore_ascii_case("USE") {
        return None;
    }
    tokens.next().map(|name| name.trim_end_matches(';').trim_matches('`'))
}

impl Connection for MemoryConnection {
    type Error = Error;

    fn database(&self) -> &str {
        &self.database
    }

    fn execute(
        &mut self,
        command: &str,
        _arguments: &[DbValue],
    ) -> impl Future<Output = Result<ExecResult, Error>> + Send {
        let command = command.to_owned();

        async move {
            let inner = &self.db.inner;
            inner.execute_count.fetch_add(1, Ordering::Relaxed);
            inner.executed.lock().push(command.clone());

            let delay = *inner.execute_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let failure = inner.execute_failure.lock().take();
            if let Some(err) = failure {
                return Err(err);
            }

            if let Some(database) = use_target(&command) {
                self.database = database.to_owned();
                return Ok(ExecResult::default());
            }

            self.db.scripted(&command)
        }
    }
}
