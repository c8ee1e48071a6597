//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::db::{ColumnInfo, DatabaseBackend, DatabaseClient, QueryResult, Row, Value};
use crate::error::{KernelError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::{Column as SqlxColumn, Either, Executor, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// PostgreSQL database client.
///
/// The pool is capped at one connection so that session state (temporary
/// tables, `SET` variables) carries over between statements.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the server named by a `postgres://` URL.
    ///
    /// A single attempt is made; failures are reported, never retried.
    pub async fn connect(url: &Url) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect(url.as_str())
            .await
            .map_err(|e| map_connection_error(e, url))?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }

    /// Fetches column metadata for a statement that returned no rows.
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
impl DatabaseClient for PostgresClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
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
                .map_err(|e| KernelError::query(format_query_error(e)))?
            {
                match step {
                    Either::Left(done) => rows_affected += done.rows_affected(),
                    Either::Right(row) => {
                        if rows.is_empty() {
                            columns = row
                                .columns()
                                .iter()
                                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                                .collect();
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

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => decode(row, index, type_name, Value::Bool),
        "INT2" | "SMALLINT" => decode(row, index, type_name, |v: i16| Value::Int(v as i64)),
        "INT4" | "INT" | "INTEGER" => decode(row, index, type_name, |v: i32| Value::Int(v as i64)),
        "INT8" | "BIGINT" => decode(row, index, type_name, Value::Int),
        "FLOAT4" | "REAL" => decode(row, index, type_name, |v: f32| Value::Float(v as f64)),
        "FLOAT8" | "DOUBLE PRECISION" => decode(row, index, type_name, Value::Float),
        "BYTEA" => decode(row, index, type_name, Value::Bytes),
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
            decode(row, index, type_name, Value::String)
        }
        // Unprepared statements come back in text format, so every other
        // type can be shown as the server rendered it.
        _ => raw_text(row, index, type_name),
    }
}

/// Decodes a value as `T`. Only SQL NULL becomes [`Value::Null`]; a value
/// that fails to decode falls back to its text form.
fn decode<'r, T>(
    row: &'r PgRow,
    index: usize,
    type_name: &str,
    wrap: impl FnOnce(T) -> Value,
) -> Result<Value>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    match row.try_get::<Option<T>, _>(index) {
        Ok(value) => Ok(value.map(wrap).unwrap_or(Value::Null)),
        Err(e) => {
            debug!("Column {index} ({type_name}) did not decode: {e}");
            raw_text(row, index, type_name)
        }
    }
}

/// Reads a value in the server's text rendering.
fn raw_text(row: &PgRow, index: usize, type_name: &str) -> Result<Value> {
    row.try_get_unchecked::<Option<String>, _>(index)
        .map(|value| value.map(Value::Other).unwrap_or(Value::Null))
        .map_err(|e| {
            KernelError::render(format!("Cannot decode column {index} ({type_name}): {e}"))
        })
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, url: &Url) -> KernelError {
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(5432);
    let user = if url.username().is_empty() {
        "unknown"
    } else {
        url.username()
    };
    let database = url
        .path()
        .strip_prefix('/')
        .filter(|db| !db.is_empty())
        .unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        KernelError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        KernelError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        KernelError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        KernelError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.",
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        KernelError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        KernelError::connection(error.to_string())
    }
}

/// Formats a query error with PostgreSQL details and hints if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        let fields = [
            ("DETAIL", pg_error.detail()),
            ("HINT", pg_error.hint()),
            ("TABLE", pg_error.table()),
            ("COLUMN", pg_error.column()),
            ("CONSTRAINT", pg_error.constraint()),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                result.push_str("\n  ");
                result.push_str(label);
                result.push_str(": ");
                result.push_str(value);
            }
        }
    }

    result
}
