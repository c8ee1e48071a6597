//! Database abstraction layer for the kernel.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod target;
mod types;

pub use mock::{MockConnector, MockDatabaseClient, MockEvents, MockLog};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use target::ConnectionTarget;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use sqlparser::dialect::{Dialect, PostgreSqlDialect, SQLiteDialect};

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    /// Parses a backend from a URL scheme or dialect name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Returns the SQL dialect used to split and classify statements for this backend.
    pub fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }
}

/// Opens live database connections.
///
/// The connection manager goes through this trait so that tests can swap
/// the real drivers for [`MockConnector`].
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes a session with the given target.
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>>;
}

/// Connector backed by the sqlx drivers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    async fn open(&self, target: &ConnectionTarget) -> Result<Box<dyn DatabaseClient>> {
        match target {
            ConnectionTarget::Sqlite { path } => {
                let client = SqliteClient::connect(path.as_deref()).await?;
                Ok(Box::new(client))
            }
            ConnectionTarget::Postgres { url } => {
                let client = PostgresClient::connect(url).await?;
                Ok(Box::new(client))
            }
        }
    }
}

/// Trait defining the interface for a single live database session.
///
/// All database operations are async and return Results with KernelError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Returns the backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Executes one SQL statement and returns its fully materialized result.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
