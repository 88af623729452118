//! Correlation state carried from an entry hook to its exit hook.

use std::{any::Any, fmt};

use crate::{request::DbRequest, telemetry::ActiveSpan};

use super::ConnectionId;

/// The two kinds of instrumented call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Establishing a connection.
    Dial,
    /// Running a command on a connection.
    Execute,
}

impl CallKind {
    /// Returns the lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Dial => "dial",
            CallKind::Execute => "execute",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an in-flight dial.
#[derive(Debug)]
pub(crate) struct DialState {
    pub(crate) span: ActiveSpan,
    pub(crate) request: DbRequest,
}

/// State of an in-flight execute.
#[derive(Debug)]
pub(crate) struct ExecuteState {
    pub(crate) span: ActiveSpan,
    pub(crate) connection: ConnectionId,
    pub(crate) request: DbRequest,
}

/// Names the shape of a type-erased state for diagnostics.
pub(crate) fn describe(state: &(dyn Any + Send)) -> &'static str {
    if state.is::<DialState>() {
        CallKind::Dial.as_str()
    } else if state.is::<ExecuteState>() {
        CallKind::Execute.as_str()
    } else {
        "unknown"
    }
}

/// Why an exit hook could not pair with its entry.
///
/// These are diagnostics only: they are logged and never surface to the
/// caller of the instrumented client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CorrelationError {
    /// The exit hook found no state in its slot.
    #[error("{hook} exit hook found no correlation state")]
    Missing {
        /// Hook that observed the problem.
        hook: CallKind,
    },

    /// The exit hook found state of another call kind.
    #[error("{hook} exit hook expected {expected} state, found {found}")]
    Mismatch {
        /// Hook that observed the problem.
        hook: CallKind,
        /// Expected state shape.
        expected: CallKind,
        /// Shape actually found.
        found: &'static str,
    },
}

impl CorrelationError {
    /// Returns the hook that observed the problem.
    pub fn hook(&self) -> CallKind {
        match self {
            CorrelationError::Missing { hook } | CorrelationError::Mismatch { hook, .. } => *hook,
        }
    }
}
