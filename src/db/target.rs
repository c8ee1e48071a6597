//! Connection string parsing.
//!
//! Accepts both SQLAlchemy-style URLs (`sqlite:///:memory:`,
//! `postgresql+psycopg2://host/db`) and sqlx-style URLs (`sqlite::memory:`,
//! `postgres://host/db`) and turns them into a [`ConnectionTarget`].

use std::fmt;
use std::path::PathBuf;

use url::Url;

use super::DatabaseBackend;
use crate::error::{KernelError, Result};

/// Where a connection directive asks the kernel to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// A SQLite database; `None` is a private in-memory database.
    Sqlite { path: Option<PathBuf> },

    /// A PostgreSQL server, as a `postgres://` URL.
    Postgres { url: Url },
}

impl ConnectionTarget {
    /// Parses a connection string.
    ///
    /// Fails with a connection error before any I/O when the string is empty,
    /// unparsable or names an unsupported backend.
    pub fn parse(conn_str: &str) -> Result<Self> {
        let conn_str = conn_str.trim();
        if conn_str.is_empty() {
            return Err(KernelError::connection("Empty connection string"));
        }

        let Some((scheme, rest)) = conn_str.split_once(':') else {
            return Err(KernelError::connection(format!(
                "Invalid connection string '{conn_str}': missing scheme"
            )));
        };

        // `dialect+driver` selects a driver in SQLAlchemy; only the dialect matters here.
        let dialect = scheme.split('+').next().unwrap_or(scheme);
        let backend = DatabaseBackend::parse(dialect).ok_or_else(|| {
            KernelError::connection(format!("Unsupported database backend '{dialect}'"))
        })?;

        match backend {
            DatabaseBackend::Sqlite => Ok(Self::Sqlite {
                path: parse_sqlite_path(rest),
            }),
            DatabaseBackend::Postgres => {
                let url = Url::parse(&format!("postgres:{rest}")).map_err(|e| {
                    KernelError::connection(format!("Invalid connection string: {e}"))
                })?;
                if url.host_str().map_or(true, str::is_empty) {
                    return Err(KernelError::connection(
                        "Invalid connection string: missing host",
                    ));
                }
                Ok(Self::Postgres { url })
            }
        }
    }

    /// Returns the backend this target connects to.
    pub fn backend(&self) -> DatabaseBackend {
        match self {
            Self::Sqlite { .. } => DatabaseBackend::Sqlite,
            Self::Postgres { .. } => DatabaseBackend::Postgres,
        }
    }

    /// Returns a display-safe string (no password) for logs and tracebacks.
    pub fn display_string(&self) -> String {
        match self {
            Self::Sqlite { path: None } => "sqlite::memory:".to_string(),
            Self::Sqlite { path: Some(path) } => format!("sqlite:{}", path.display()),
            Self::Postgres { url } => {
                let mut redacted = url.clone();
                if redacted.password().is_some() {
                    // Only fails for cannot-be-a-base URLs, which were rejected in parse.
                    let _ = redacted.set_password(Some("****"));
                }
                redacted.to_string()
            }
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// Extracts the database path from the part of a SQLite URL after `sqlite:`.
fn parse_sqlite_path(rest: &str) -> Option<PathBuf> {
    let rest = rest.split('?').next().unwrap_or_default();

    let path = match rest.strip_prefix("//") {
        // sqlite://<host>/<path>; the host is always empty for SQLite.
        Some(authority_and_path) => authority_and_path
            .strip_prefix('/')
            .unwrap_or(authority_and_path),
        None => rest,
    };

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
