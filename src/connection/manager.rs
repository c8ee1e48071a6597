//! Connection manager for the session's single database connection.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::db::{ConnectionTarget, Connector, DatabaseClient};
use crate::error::Result;

/// An active database connection with its target.
pub struct ActiveConnection {
    /// Where the connection points.
    pub target: ConnectionTarget,
    /// Database client.
    pub db: Box<dyn DatabaseClient>,
}

/// Owns at most one live connection and replaces it on request.
pub struct ConnectionManager {
    active: Option<ActiveConnection>,
    connector: Box<dyn Connector>,
    aliases: HashMap<String, String>,
}

impl ConnectionManager {
    /// Creates a disconnected manager that opens connections through `connector`.
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            active: None,
            connector,
            aliases: HashMap::new(),
        }
    }

    /// Registers named connections that directives may refer to.
    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Resolves a named connection to its connection string.
    ///
    /// Strings containing `:` are always connection strings and are returned as is.
    pub fn resolve<'s>(&'s self, conn_str: &'s str) -> &'s str {
        if conn_str.contains(':') {
            return conn_str;
        }
        self.aliases
            .get(conn_str)
            .map(String::as_str)
            .unwrap_or(conn_str)
    }

    /// Replaces the current connection with one opened from `conn_str`.
    ///
    /// The current connection is closed before the new one is attempted, so
    /// on failure the manager is left disconnected.
    pub async fn open_connection(&mut self, conn_str: &str) -> Result<()> {
        if let Some(old) = self.active.take() {
            info!("Closing connection to {}", old.target);
            if let Err(e) = old.db.close().await {
                warn!("Ignoring error while closing {}: {e}", old.target);
            }
        }

        let target = ConnectionTarget::parse(self.resolve(conn_str))?;
        info!("Connecting to {}", target);
        let db = self.connector.open(&target).await?;

        self.active = Some(ActiveConnection { target, db });
        Ok(())
    }

    /// Get the active database client.
    pub fn db(&self) -> Option<&dyn DatabaseClient> {
        self.active.as_ref().map(|c| c.db.as_ref())
    }

    /// Get the target of the active connection.
    pub fn target(&self) -> Option<&ConnectionTarget> {
        self.active.as_ref().map(|c| &c.target)
    }

    /// Check if there's an active connection.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Close the active connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.active.take() {
            info!("Closing connection to {}", conn.target);
            conn.db.close().await?;
        }
        Ok(())
    }
}
