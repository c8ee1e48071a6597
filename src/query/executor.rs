//! Statement execution with classification and rendering.
//!
//! Provides isolated statement execution that can be tested independently
//! of the kernel.

use sqlparser::dialect::Dialect;
use tracing::debug;

use crate::classify::{StatementClassifier, StatementKind};
use crate::db::{DatabaseClient, QueryResult};
use crate::error::Result;

use super::format::format_result_set;

/// Runs statements against one connection and renders their outcome.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    classifier: StatementClassifier,
}

impl<'a> QueryExecutor<'a> {
    /// Creates an executor that classifies with the dialect of `db`'s backend.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self {
            db,
            classifier: StatementClassifier::for_backend(db.backend()),
        }
    }

    /// Returns the dialect used to split and classify statements.
    pub fn dialect(&self) -> &dyn Dialect {
        self.classifier.dialect()
    }

    /// Submits a statement without rendering anything.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let result = self.db.execute_query(sql).await?;
        debug!(
            rows = result.rows.len(),
            rows_affected = result.rows_affected,
            elapsed_ms = result.execution_time.as_millis() as u64,
            "Statement executed"
        );
        Ok(result)
    }

    /// Submits a statement and renders its outcome.
    ///
    /// Returns `None` for statement kinds that produce no output.
    pub async fn run_statement(&self, sql: &str) -> Result<Option<String>> {
        let result = self.execute(sql).await?;
        let kind = self.classifier.classify(sql);
        render_outcome(kind, &result)
    }
}

/// Renders a statement's result according to its kind.
///
/// The kind decides the rendering, not the shape of the result: a
/// non-`SELECT` statement that returned rows still renders as its kind.
pub fn render_outcome(kind: StatementKind, result: &QueryResult) -> Result<Option<String>> {
    let text = match kind {
        StatementKind::Select => format_result_set(&result.column_names(), &result.rows)?,
        StatementKind::Insert => "Insert succeeded\n".to_string(),
        StatementKind::Update => format!("Updated {} rows\n", result.rows_affected),
        StatementKind::Delete => format!("Deleted {} rows\n", result.rows_affected),
        StatementKind::Other => return Ok(None),
    };
    Ok(Some(text))
}
