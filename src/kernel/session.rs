//! Per-kernel mutable state.

use crate::connection::ConnectionManager;

/// State carried across execute calls.
pub struct Session {
    connections: ConnectionManager,
    execution_count: u64,
}

impl Session {
    /// Creates a disconnected session.
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            connections,
            execution_count: 0,
        }
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    /// Number of execute calls started so far.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Counts a new execute call and returns its number.
    pub fn next_execution_count(&mut self) -> u64 {
        self.execution_count += 1;
        self.execution_count
    }
}
