//! Error types for the SQL kernel.
//!
//! Defines the error taxonomy surfaced to the host as `ename`/`evalue` pairs.

use thiserror::Error;

/// Main error type for kernel operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Connection string parse or open failures.
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQL submitted while no connection is active.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Statement execution failures (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Result set shape that cannot be rendered as a table.
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration errors (invalid config file, unknown traceback style, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed host messages or failures writing to the host.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KernelError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a usage error with the given message.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a render error with the given message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a protocol error with the given message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Usage(_) => "Usage Error",
            Self::Query(_) => "Query Error",
            Self::Render(_) => "Render Error",
            Self::Config(_) => "Configuration Error",
            Self::Protocol(_) => "Protocol Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the error kind label reported to the host as `ename`.
    pub fn ename(&self) -> &'static str {
        match self {
            Self::Connection(_) => "ConnectionError",
            Self::Usage(_) => "UsageError",
            Self::Query(_) => "QueryError",
            Self::Render(_) => "RenderError",
            Self::Config(_) => "ConfigError",
            Self::Protocol(_) => "ProtocolError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Returns the bare message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Usage(msg)
            | Self::Query(msg)
            | Self::Render(msg)
            | Self::Config(msg)
            | Self::Protocol(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl From<std::io::Error> for KernelError {
    fn from(e: std::io::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

/// Result type alias using KernelError.
pub type Result<T> = std::result::Result<T, KernelError>;
