//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient` trait
//! for SQLite databases (file-backed or in-memory) using sqlx.

use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row, Value};
use crate::error::{KernelError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Either, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// SQLite database client.
///
/// Holds a pool capped at one connection that is never reaped, so an
/// in-memory database lives exactly as long as the client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens a SQLite database. `None` opens a fresh in-memory database.
    pub async fn connect(path: Option<&Path>) -> Result<Self> {
        let options = match path {
            None => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| KernelError::connection(e.to_string()))?,
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| map_connection_error(e, path))?;

        debug!("Opened SQLite database");
        Ok(Self { pool })
    }

    /// Recovers column names for a statement that produced no rows.
    ///
    /// Best effort: statements that cannot be described (DDL, statements
    /// whose objects no longer exist) yield no columns.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match self.pool.describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not describe statement: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let mut columns: Vec<ColumnInfo> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();
        let mut rows_affected = 0u64;

        {
            let mut results = self.pool.fetch_many(sql);
            while let Some(step) = results
                .try_next()
                .await
                .map_err(|e| KernelError::query(format_query_error(&e)))?
            {
                match step {
                    Either::Left(done) => rows_affected += done.rows_affected(),
                    Either::Right(row) => {
                        if rows.is_empty() {
                            columns = column_info(&row);
                        }
                        rows.push(convert_row(&row)?);
                    }
                }
            }
        }

        if rows.is_empty() {
            columns = self.describe_columns(sql).await;
        }

        Ok(QueryResult::with_data(columns, rows)
            .with_rows_affected(rows_affected)
            .with_execution_time(start.elapsed()))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Extracts column metadata from a row.
fn column_info(row: &SqliteRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value, keyed off the value's storage class rather than
/// the column's declared type.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| KernelError::render(format!("Cannot read column {index}: {e}")))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage_class = raw.type_info().name().to_uppercase();

    match storage_class.as_str() {
        "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => decode(row, index, Value::Int),
        "REAL" | "FLOAT" | "DOUBLE" => decode(row, index, Value::Float),
        "BLOB" => decode(row, index, Value::Bytes),
        "TEXT" => decode(row, index, Value::String),
        _ => raw_text(row, index),
    }
}

/// Decodes a non-NULL value as `T`, falling back to its text form.
fn decode<'r, T>(row: &'r SqliteRow, index: usize, wrap: impl FnOnce(T) -> Value) -> Result<Value>
where
    T: sqlx::Decode<'r, Sqlite>,
{
    match row.try_get_unchecked::<T, _>(index) {
        Ok(value) => Ok(wrap(value)),
        Err(e) => {
            debug!("Column {index} did not decode as its storage class: {e}");
            raw_text(row, index)
        }
    }
}

/// Reads a non-NULL value as text, failing when it has none.
fn raw_text(row: &SqliteRow, index: usize) -> Result<Value> {
    row.try_get_unchecked::<String, _>(index)
        .map(Value::Other)
        .map_err(|e| KernelError::render(format!("Cannot decode column {index}: {e}")))
}

/// Maps sqlx open errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, path: Option<&Path>) -> KernelError {
    let location = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());

    let error_str = error.to_string().to_lowercase();
    if error_str.contains("unable to open database file") {
        KernelError::connection(format!("Cannot open SQLite database '{location}'."))
    } else {
        KernelError::connection(format!("SQLite database '{location}': {error}"))
    }
}

/// Formats a query error, preferring the database's own message.
fn format_query_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
