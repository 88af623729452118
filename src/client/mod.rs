//! Client decorator: wraps a database driver so every dial and execute runs
//! through the correlation hooks.
//!
//! The driver is abstracted by two traits:
//! - [`Dialer`]: opens connections
//! - [`Connection`]: runs commands
//!
//! [`InstrumentedDialer`] and [`InstrumentedConnection`] wrap them. Errors
//! from the driver pass through unchanged; telemetry never fails a call.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dbtel::{
//!     client::DialParams,
//!     config::{FeatureEnabler, InstrumentationConfig},
//!     mysql::MySqlInstrumentation,
//!     telemetry::InMemorySpanRecorder,
//!     testing::MemoryDatabase,
//! };
//!
//! # tokio_test_runtime(async {
//! let recorder = InMemorySpanRecorder::new();
//! let instrumentation = MySqlInstrumentation::new(
//!     InstrumentationConfig::default(),
//!     Arc::new(FeatureEnabler::default()),
//!     recorder.clone(),
//! );
//! let dialer = instrumentation.wrap(MemoryDatabase::new());
//!
//! let params = DialParams::builder().address("db:3306").database("shop").build();
//! let mut conn = dialer.dial(&params).await?;
//! conn.execute("SELECT * FROM orders WHERE id = ?", &[7.into()]).await?;
//!
//! assert_eq!(recorder.len(), 2);
//! # Ok::<(), dbtel::Error>(())
//! # });
//! # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

mod guard;
mod params;

use std::{error::Error as StdError, future::Future, sync::Arc};

pub use params::DialParams;

use self::guard::CallGuard;
use crate::{
    correlation::{CallKind, ConnectionId, DbHooks},
    request::{DbValue, ExecResult},
    telemetry::TraceContext,
};

/// Opens connections to a database server.
pub trait Dialer: Send + Sync {
    /// Connection produced by a successful dial.
    type Connection: Connection;

    /// Error produced by a failed dial.
    type Error: StdError + Send + Sync + 'static;

    /// Opens a connection.
    fn dial(
        &self,
        params: &DialParams,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// An open connection to a database server.
pub trait Connection: Send {
    /// Error produced by a failed command.
    type Error: StdError + Send + Sync + 'static;

    /// Returns the database the connection currently uses.
    fn database(&self) -> &str;

    /// Runs `command` with positional `arguments`.
    fn execute(
        &mut self,
        command: &str,
        arguments: &[DbValue],
    ) -> impl Future<Output = Result<ExecResult, Self::Error>> + Send;
}

/// A [`Dialer`] whose dials are traced.
#[derive(Debug, Clone)]
pub struct InstrumentedDialer<D> {
    inner: D,
    hooks: Arc<DbHooks>,
}

impl<D: Dialer> InstrumentedDialer<D> {
    /// Wraps `inner`, reporting through `hooks`.
    pub fn new(inner: D, hooks: Arc<DbHooks>) -> Self {
        Self { inner, hooks }
    }

    /// Returns the wrapped dialer.
    pub fn get_ref(&self) -> &D {
        &self.inner
    }

    /// Returns the hooks.
    pub fn hooks(&self) -> &Arc<DbHooks> {
        &self.hooks
    }

    /// Opens a connection whose dial span is a new root.
    pub async fn dial(
        &self,
        params: &DialParams,
    ) -> Result<InstrumentedConnection<D::Connection>, D::Error> {
        self.dial_with_parent(None, params).await
    }

    /// Opens a connection whose dial span is a child of `parent`.
    pub async fn dial_with_parent(
        &self,
        parent: Option<&TraceContext>,
        params: &DialParams,
    ) -> Result<InstrumentedConnection<D::Connection>, D::Error> {
        let mut guard = CallGuard::new(Arc::clone(&self.hooks), CallKind::Dial);
        self.hooks.on_before_dial(guard.slot_mut(), parent, params);

        match self.inner.dial(params).await {
            Ok(inner) => {
                let id = ConnectionId::next();
                guard.complete_dial(Some(id), None);
                Ok(InstrumentedConnection { inner, id, hooks: Arc::clone(&self.hooks) })
            }
            Err(err) => {
                guard.complete_dial(None, Some(&err));
                Err(err)
            }
        }
    }
}

/// A [`Connection`] whose executes are traced as children of its dial.
///
/// Dropping the connection forgets its dial context.
#[derive(Debug)]
pub struct InstrumentedConnection<C> {
    inner: C,
    id: ConnectionId,
    hooks: Arc<DbHooks>,
}

impl<C: Connection> InstrumentedConnection<C> {
    /// Returns the connection identity.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the database the connection currently uses.
    pub fn database(&self) -> &str {
        self.inner.database()
    }

    /// Returns the wrapped connection.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Returns the wrapped connection mutably.
    ///
    /// Calls made directly on it are not traced.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Runs `command` with positional `arguments`.
    pub async fn execute(
        &mut self,
        command: &str,
        arguments: &[DbValue],
    ) -> Result<ExecResult, C::Error> {
        let mut guard = CallGuard::new(Arc::clone(&self.hooks), CallKind::Execute);
        self.hooks.on_before_execute(
            guard.slot_mut(),
            self.id,
            command,
            arguments,
            self.inner.database(),
        );

        let result = self.inner.execute(command, arguments).await;
        match &result {
            Ok(exec) => guard.complete_execute(Some(exec), None),
            Err(err) => guard.complete_execute(None, Some(err)),
        }
        result
    }

    /// Closes the connection.
    pub fn close(self) {
        drop(self);
    }
}

impl<C> Drop for InstrumentedConnection<C> {
    fn drop(&mut self) {
        self.hooks.on_close(self.id);
    }
}
