//! Connection-scoped table of dial contexts.

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;

use crate::telemetry::TraceContext;

/// Identity of one instrumented connection, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What a successful dial leaves behind for the connection's executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    /// Context of the dial span; executes become its children.
    pub context: TraceContext,
    /// Endpoint that was dialed.
    pub endpoint: String,
    /// Database selected at dial time.
    pub namespace: String,
}

/// Maps live connections to their dial context.
///
/// Entries are written once per successful dial and removed when the
/// connection closes, so two connections never observe each other's
/// endpoint or namespace.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionContext>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the dial context of `id`, replacing any previous entry.
    pub fn register(&self, id: ConnectionId, context: ConnectionContext) {
        self.connections.write().insert(id, context);
    }

    /// Returns a copy of the dial context of `id`.
    pub fn get(&self, id: ConnectionId) -> Option<ConnectionContext> {
        self.connections.read().get(&id).cloned()
    }

    /// Forgets `id`, returning its context if it was registered.
    pub fn remove(&self, id: ConnectionId) -> Option<ConnectionContext> {
        self.connections.write().remove(&id)
    }

    /// Returns the number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns `true` if no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
