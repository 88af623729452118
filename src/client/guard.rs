//! Drop guard pairing every entry hook with an exit hook.

use std::{error::Error as StdError, sync::Arc};

use crate::{
    Error, ErrorKind,
    correlation::{CallKind, CallSlot, ConnectionId, DbHooks},
    request::ExecResult,
};

/// Owns the [`CallSlot`] of one call across its await point.
///
/// If the call future is dropped or unwinds before completing, `Drop`
/// runs the exit hook with a cancellation error so the span is still
/// ended.
pub(super) struct CallGuard {
    hooks: Arc<DbHooks>,
    kind: CallKind,
    slot: CallSlot,
    completed: bool,
}

impl CallGuard {
    pub(super) fn new(hooks: Arc<DbHooks>, kind: CallKind) -> Self {
        Self { hooks, kind, slot: CallSlot::new(), completed: false }
    }

    pub(super) fn slot_mut(&mut self) -> &mut CallSlot {
        &mut self.slot
    }

    pub(super) fn complete_dial(
        &mut self,
        connection: Option<ConnectionId>,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        self.completed = true;
        // Correlation errors are already logged by the hook.
        let _ = self.hooks.on_exit_dial(&mut self.slot, connection, error);
    }

    pub(super) fn complete_execute(
        &mut self,
        result: Option<&ExecResult>,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        self.completed = true;
        let _ = self.hooks.on_exit_execute(&mut self.slot, result, error);
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        tracing::debug!(kind = %self.kind, "call dropped before completion");
        let err = Error::new(ErrorKind::Cancelled, "call dropped before completion");
        match self.kind {
            CallKind::Dial => self.complete_dial(None, Some(&err)),
            CallKind::Execute => self.complete_execute(None, Some(&err)),
        }
    }
}
