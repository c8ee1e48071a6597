//! Configuration management for the SQL kernel.
//!
//! Handles loading configuration from TOML files, with support for named
//! database connections and error-reporting settings.

use crate::error::{KernelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Kernel behaviour settings.
    #[serde(default)]
    pub kernel: KernelConfig,

    /// Named database connections, usable as `!name;`.
    #[serde(default)]
    pub connections: HashMap<String, NamedConnection>,
}

/// Kernel behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KernelConfig {
    /// How much detail error tracebacks carry.
    #[serde(default)]
    pub traceback: TracebackStyle,

    /// Connection string (or connection name) opened when the kernel starts.
    #[serde(default)]
    pub startup_connection: Option<String>,
}

/// A named database connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedConnection {
    /// Connection string, e.g. `postgresql://reader@db.internal/analytics`.
    pub url: String,
}

/// Verbosity of the traceback attached to error replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracebackStyle {
    /// A single `ename: evalue` line.
    #[default]
    Short,
    /// The summary line plus where the failure happened.
    Full,
}

impl FromStr for TracebackStyle {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "full" => Ok(Self::Full),
            _ => Err(KernelError::config(format!(
                "Invalid traceback style: {s}. Expected: short or full"
            ))),
        }
    }
}

impl fmt::Display for TracebackStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sql-kernel")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| KernelError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            KernelError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Returns the named connections as a name → connection string map.
    pub fn connection_aliases(&self) -> HashMap<String, String> {
        self.connections
            .iter()
            .map(|(name, conn)| (name.clone(), conn.url.clone()))
            .collect()
    }
}
