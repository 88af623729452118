//! Entry and exit hooks for dial and execute calls.

use std::{any::Any, error::Error as StdError, sync::Arc};

use super::{
    CallKind, CallSlot, ConnectionContext, ConnectionId, ConnectionRegistry, CorrelationError,
    state::{DialState, ExecuteState, describe},
};
use crate::{
    classifier::classify_operation,
    client::DialParams,
    config::FeatureEnabler,
    instrumenter::Instrumenter,
    request::{DbRequest, DbResponse, DbValue, ExecResult},
    telemetry::TraceContext,
};

/// The hook set invoked around every dial and execute call.
///
/// Each call owns one [`CallSlot`]. The entry hook starts a span and parks
/// it in the slot; the exit hook takes it back out, ends it with the
/// outcome and exports it. Dial and execute are independent
/// `idle -> in-flight -> idle` machines that share only the
/// [`ConnectionRegistry`], through which a successful dial becomes the
/// parent of every execute on that connection.
///
/// Hooks never fail the instrumented call. Exit hooks report correlation
/// problems as [`CorrelationError`] after logging them. State an exit hook
/// takes but cannot end (instrumentation disabled meanwhile, or state of the
/// other call kind) is abandoned, so listeners release what they counted at
/// start.
#[derive(Debug, Clone)]
pub struct DbHooks {
    instrumenter: Arc<Instrumenter<DbRequest, DbResponse>>,
    enabler: Arc<FeatureEnabler>,
    connections: Arc<ConnectionRegistry>,
}

impl DbHooks {
    /// Creates hooks around `instrumenter`, gated by `enabler`.
    pub fn new(
        instrumenter: Arc<Instrumenter<DbRequest, DbResponse>>,
        enabler: Arc<FeatureEnabler>,
    ) -> Self {
        Self { instrumenter, enabler, connections: Arc::new(ConnectionRegistry::new()) }
    }

    /// Returns the instrumenter.
    pub fn instrumenter(&self) -> &Arc<Instrumenter<DbRequest, DbResponse>> {
        &self.instrumenter
    }

    /// Returns the enabler.
    pub fn enabler(&self) -> &Arc<FeatureEnabler> {
        &self.enabler
    }

    /// Returns the connection registry.
    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    /// Entry hook of a dial.
    pub fn on_before_dial(
        &self,
        slot: &mut CallSlot,
        parent: Option<&TraceContext>,
        params: &DialParams,
    ) {
        if !self.enabler.is_enabled() {
            return;
        }

        let request = DbRequest::builder()
            .endpoint(params.address())
            .namespace(params.database())
            .maybe_context(parent.cloned())
            .build();
        let span = self.instrumenter.start(parent, &request);
        tracing::debug!(
            endpoint = params.address(),
            database = params.database(),
            span_id = %span.context().span_id(),
            "dial started"
        );

        slot.set(DialState { span, request });
    }

    /// Exit hook of a dial.
    ///
    /// On success `connection` names the new connection, which is then
    /// registered as the parent of its executes.
    pub fn on_exit_dial(
        &self,
        slot: &mut CallSlot,
        connection: Option<ConnectionId>,
        error: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), CorrelationError> {
        if !self.enabler.is_enabled() {
            if let Some(state) = slot.take() {
                self.abandon(state);
            }
            return Ok(());
        }

        let state = self.take_state::<DialState>(slot, CallKind::Dial)?;
        let DialState { span, request } = *state;

        if let (None, Some(id)) = (error, connection) {
            self.connections.register(
                id,
                ConnectionContext {
                    context: span.context().clone(),
                    endpoint: request.endpoint().to_owned(),
                    namespace: request.namespace().to_owned(),
                },
            );
        }

        let end = end_view(&request, span.context());
        let response = error.is_none().then_some(DbResponse::Connected);
        tracing::debug!(
            endpoint = request.endpoint(),
            connection = ?connection.map(|id| id.get()),
            failed = error.is_some(),
            "dial finished"
        );
        self.instrumenter.end(span, &end, response.as_ref(), error);

        Ok(())
    }

    /// Entry hook of an execute.
    ///
    /// `namespace` is the database the connection currently uses; when
    /// empty the one recorded at dial time is used.
    pub fn on_before_execute(
        &self,
        slot: &mut CallSlot,
        connection: ConnectionId,
        command: &str,
        arguments: &[DbValue],
        namespace: &str,
    ) {
        if !self.enabler.is_enabled() {
            return;
        }

        let dial = self.connections.get(connection);
        let parent = dial.as_ref().map(|d| &d.context);
        let endpoint = dial.as_ref().map(|d| d.endpoint.as_str()).unwrap_or_default();
        let namespace = match (namespace, &dial) {
            ("", Some(d)) => d.namespace.as_str(),
            (ns, _) => ns,
        };

        let request = DbRequest::builder()
            .operation(classify_operation(command))
            .arguments(arguments.to_vec())
            .endpoint(endpoint)
            .command(command)
            .namespace(namespace)
            .maybe_context(parent.cloned())
            .build();
        let span = self.instrumenter.start(parent, &request);
        tracing::debug!(
            connection = %connection,
            command,
            registered = dial.is_some(),
            span_id = %span.context().span_id(),
            "execute started"
        );

        slot.set(ExecuteState { span, connection, request });
    }

    /// Exit hook of an execute.
    pub fn on_exit_execute(
        &self,
        slot: &mut CallSlot,
        result: Option<&ExecResult>,
        error: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), CorrelationError> {
        if !self.enabler.is_enabled() {
            if let Some(state) = slot.take() {
                self.abandon(state);
            }
            return Ok(());
        }

        let state = self.take_state::<ExecuteState>(slot, CallKind::Execute)?;
        let ExecuteState { span, connection, request } = *state;

        let end = end_view(&request, span.context());

        let response = match (error, result) {
            (None, Some(result)) => Some(DbResponse::Executed(*result)),
            _ => None,
        };
        tracing::debug!(
            connection = %connection,
            command = request.command(),
            failed = error.is_some(),
            "execute finished"
        );
        self.instrumenter.end(span, &end, response.as_ref(), error);

        Ok(())
    }

    /// Forgets the dial context of a closed connection.
    pub fn on_close(&self, connection: ConnectionId) {
        if self.connections.remove(connection).is_some() {
            tracing::debug!(connection = %connection, "connection closed");
        }
    }

    /// Takes the state of kind `T` out of `slot`, logging any mismatch.
    fn take_state<T: 'static>(
        &self,
        slot: &mut CallSlot,
        hook: CallKind,
    ) -> Result<Box<T>, CorrelationError> {
        let Some(state) = slot.take() else {
            let err = CorrelationError::Missing { hook };
            tracing::warn!(error = %err, "dropping exit without entry");
            return Err(err);
        };

        state.downcast::<T>().map_err(|other| {
            let err = CorrelationError::Mismatch { hook, expected: hook, found: describe(&*other) };
            tracing::warn!(error = %err, "dropping exit with foreign state");
            self.abandon(other);
            err
        })
    }

    /// Discards a started call without ending its span.
    fn abandon(&self, state: Box<dyn Any + Send>) {
        match state.downcast::<DialState>() {
            Ok(dial) => {
                let DialState { span, request } = *dial;
                self.instrumenter.abandon(span, &request);
            }
            Err(other) => {
                if let Ok(execute) = other.downcast::<ExecuteState>() {
                    let ExecuteState { span, request, .. } = *execute;
                    self.instrumenter.abandon(span, &request);
                }
            }
        }
    }
}

/// Builds the end view of a call from its start view.
fn end_view(start: &DbRequest, context: &TraceContext) -> DbRequest {
    DbRequest::builder()
        .maybe_operation(start.operation())
        .arguments(start.arguments().to_vec())
        .endpoint(start.endpoint())
        .command(start.command())
        .namespace(start.namespace())
        .context(context.clone())
        .started_at(start.started_at())
        .build()
}
