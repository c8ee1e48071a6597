//! Mock database client for testing.
//!
//! Provides a scripted in-memory connector that records every open, every
//! submitted statement and every close, so tests can assert exactly what
//! reached the database.

use super::{
    ColumnInfo, ConnectionTarget, Connector, DatabaseBackend, DatabaseClient, QueryResult, Value,
};
use crate::error::{KernelError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Everything the mock connector and its clients have observed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MockEvents {
    /// Display strings of successfully opened targets, in order.
    pub opened: Vec<String>,
    /// Display strings of closed clients, in order.
    pub closed: Vec<String>,
    /// `(target, sql)` for every statement submitted, in order.
    pub submitted: Vec<(String, String)>,
}

/// Shared handle onto [`MockEvents`].
#[derive(Debug, Default, Clone)]
pub struct MockLog {
    events: Arc<Mutex<MockEvents>>,
}

impl MockLog {
    fn lock(&self) -> MutexGuard<'_, MockEvents> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a snapshot of the recorded events.
    pub fn snapshot(&self) -> MockEvents {
        self.lock().clone()
    }

    /// Returns the SQL of every submitted statement, in order.
    pub fn submitted_sql(&self) -> Vec<String> {
        self.lock()
            .submitted
            .iter()
            .map(|(_, sql)| sql.clone())
            .collect()
    }
}

/// A canned response for statements containing a pattern.
#[derive(Debug, Clone)]
enum Scripted {
    Result(QueryResult),
    Error(String),
}

/// A connector that opens [`MockDatabaseClient`]s.
#[derive(Debug, Default, Clone)]
pub struct MockConnector {
    log: MockLog,
    refused: Vec<String>,
    script: Vec<(String, Scripted)>,
    fail_close: bool,
}

impl MockConnector {
    /// Creates a connector that accepts every target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses to open targets whose display string contains `pattern`.
    pub fn refuse(mut self, pattern: impl Into<String>) -> Self {
        self.refused.push(pattern.into());
        self
    }

    /// Statements containing `pattern` fail with the given driver message.
    pub fn fail_on(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.script
            .push((pattern.into(), Scripted::Error(message.into())));
        self
    }

    /// Statements containing `pattern` return `result`.
    pub fn respond(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.script.push((pattern.into(), Scripted::Result(result)));
        self
    }

    /// Makes every client's `close` fail.
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Returns the shared event log.
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>> {
        let name = target.display_string();
        if self.refused.iter().any(|p| name.contains(p.as_str())) {
            return Err(KernelError::connection(format!(
                "Cannot connect to {name}: refused by mock"
            )));
        }

        self.log.lock().opened.push(name.clone());
        Ok(Box::new(MockDatabaseClient {
            name,
            backend: target.backend(),
            log: self.log.clone(),
            script: self.script.clone(),
            fail_close: self.fail_close,
        }))
    }
}

/// A mock database client that returns scripted results.
///
/// Unscripted `SELECT`s return one `result` column holding the statement
/// text; `UPDATE` and `DELETE` report one affected row; everything else
/// returns an empty result.
pub struct MockDatabaseClient {
    name: String,
    backend: DatabaseBackend,
    log: MockLog,
    script: Vec<(String, Scripted)>,
    fail_close: bool,
}

impl MockDatabaseClient {
    /// Creates a standalone mock client with its own log.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            backend: DatabaseBackend::Sqlite,
            log: MockLog::default(),
            script: Vec::new(),
            fail_close: false,
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.log
            .lock()
            .submitted
            .push((self.name.clone(), sql.to_string()));

        let scripted = self
            .script
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()));
        match scripted {
            Some((_, Scripted::Result(result))) => return Ok(result.clone()),
            Some((_, Scripted::Error(message))) => return Err(KernelError::query(message.clone())),
            None => {}
        }

        let sql_upper = sql.trim_start().to_uppercase();
        let result = if sql_upper.starts_with("SELECT") {
            QueryResult::with_data(
                vec![ColumnInfo::new("result", "text")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )
        } else if sql_upper.starts_with("UPDATE") || sql_upper.starts_with("DELETE") {
            QueryResult::new().with_rows_affected(1)
        } else {
            QueryResult::new()
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        self.log.lock().closed.push(self.name.clone());
        if self.fail_close {
            return Err(KernelError::connection("mock close failure"));
        }
        Ok(())
    }
}
