//! Per-call storage linking an entry hook to its exit hook.

use std::any::Any;

/// Holds the correlation state of exactly one call.
///
/// The slot is type-erased so that an exit hook can detect state of the
/// wrong shape instead of trusting it. It is owned by the call and never
/// shared between calls.
#[derive(Default)]
pub struct CallSlot {
    state: Option<Box<dyn Any + Send>>,
}

impl CallSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `state`, replacing anything already held.
    pub fn set<T: Any + Send>(&mut self, state: T) {
        self.state = Some(Box::new(state));
    }

    /// Removes and returns the held state.
    pub fn take(&mut self) -> Option<Box<dyn Any + Send>> {
        self.state.take()
    }

    /// Returns `true` if no state is held.
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
    }
}

impl std::fmt::Debug for CallSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSlot").field("occupied", &self.state.is_some()).finish()
    }
}
