//! Command-line argument parsing for the SQL kernel.

use crate::config::{Config, TracebackStyle};
use clap::Parser;
use std::path::PathBuf;

/// Where the kernel reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Serve JSON-lines requests on stdin/stdout.
    Serve,
    /// Execute a script file as one cell.
    Script(PathBuf),
    /// Execute stdin as one cell.
    Stdin,
}

/// An interactive SQL kernel for SQLite and PostgreSQL.
#[derive(Parser, Debug)]
#[command(name = "sql-kernel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL script to execute as a single cell ("-" for stdin). Without it the
    /// kernel serves JSON-lines requests on stdin/stdout.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Connection string (or named connection) opened at start-up
    #[arg(short = 'c', long, value_name = "URL", env = "SQL_KERNEL_URL")]
    pub connect: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Traceback detail for error replies (short or full)
    #[arg(long, value_name = "STYLE")]
    pub traceback: Option<TracebackStyle>,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the input mode selected by the SCRIPT argument.
    pub fn mode(&self) -> Mode {
        match self.script.as_deref() {
            None => Mode::Serve,
            Some("-") => Mode::Stdin,
            Some(path) => Mode::Script(PathBuf::from(path)),
        }
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(style) = self.traceback {
            config.kernel.traceback = style;
        }
        if let Some(url) = &self.connect {
            config.kernel.startup_connection = Some(url.clone());
        }
    }
}
