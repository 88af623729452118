//! Call correlation: pairing each entry hook with its exit hook and each
//! connection's executes with its dial.
//!
//! - [`CallSlot`]: per-call storage owned by the instrumented call
//! - [`ConnectionRegistry`]: dial contexts keyed by [`ConnectionId`]
//! - [`DbHooks`]: the entry/exit hooks themselves
//! - [`CorrelationError`]: diagnostics for exits that cannot be paired

mod hooks;
mod registry;
mod slot;
mod state;

pub use hooks::DbHooks;
pub use registry::{ConnectionContext, ConnectionId, ConnectionRegistry};
pub use slot::CallSlot;
pub use state::{CallKind, CorrelationError};
