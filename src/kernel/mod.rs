//! The execution engine.
//!
//! A [`Kernel`] owns the session and turns each execute request into a
//! sequence of connection changes and statement executions, publishing one
//! stream notification per rendered statement and at most one error.

mod session;

pub use session::Session;

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::config::{Config, TracebackStyle};
use crate::connection::ConnectionManager;
use crate::db::{ConnectionTarget, Connector, SqlxConnector};
use crate::error::{KernelError, Result};
use crate::protocol::{
    ErrorReport, ExecuteReply, ExecutionOutcome, KernelInfo, Message, Publisher, StreamContent,
};
use crate::query::QueryExecutor;
use crate::split::{split_blocks, split_statements, InputBlock};

/// Where in a cell an execute call failed. Blocks and statements count from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FailureSite {
    Directive { block: usize, target: String },
    Batch { block: usize },
    Statement { block: usize, statement: usize, sql: String },
}

impl fmt::Display for FailureSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directive { block, target } => {
                write!(f, "block {block}, connection directive: {target}")
            }
            Self::Batch { block } => write!(f, "block {block}, SQL batch"),
            Self::Statement {
                block,
                statement,
                sql,
            } => write!(f, "block {block}, statement {statement}: {sql}"),
        }
    }
}

struct Failure {
    error: KernelError,
    site: FailureSite,
}

impl Failure {
    fn at(error: KernelError, site: FailureSite) -> Self {
        Self { error, site }
    }
}

/// An interactive SQL kernel holding a single-connection session.
pub struct Kernel {
    session: Session,
    traceback: TracebackStyle,
}

impl Kernel {
    /// Creates a disconnected kernel that opens connections through `connector`.
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            session: Session::new(ConnectionManager::new(connector)),
            traceback: TracebackStyle::default(),
        }
    }

    /// Creates a kernel backed by the real drivers, with the configured
    /// named connections and traceback style.
    pub fn from_config(config: &Config) -> Self {
        let connections = ConnectionManager::new(Box::new(SqlxConnector))
            .with_aliases(config.connection_aliases());
        Self {
            session: Session::new(connections),
            traceback: config.kernel.traceback,
        }
    }

    /// Sets how much context error tracebacks carry.
    pub fn with_traceback(mut self, style: TracebackStyle) -> Self {
        self.traceback = style;
        self
    }

    /// Returns the session state: the connection and the execution counter.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Describes this kernel for a `kernel_info_reply`.
    pub fn kernel_info(&self) -> KernelInfo {
        KernelInfo::current()
    }

    /// Opens a connection outside of any execute call.
    pub async fn connect(&mut self, conn_str: &str) -> Result<()> {
        self.session.connections_mut().open_connection(conn_str).await
    }

    /// Closes the session's connection, if any.
    pub async fn shutdown(&mut self) {
        info!("Shutting down kernel");
        if let Err(e) = self.session.connections_mut().close().await {
            warn!("Error while closing connection at shutdown: {e}");
        }
    }

    /// Executes one cell.
    ///
    /// Stream notifications for rendered statements are published as they
    /// complete (none when `silent`). On failure exactly one error
    /// notification is published and nothing after the failing step runs.
    pub async fn execute(
        &mut self,
        code: &str,
        silent: bool,
        publisher: &mut dyn Publisher,
    ) -> ExecuteReply {
        let execution_count = self.session.next_execution_count();
        debug!(execution_count, silent, "Executing cell");

        let outcome = match self.run_cell(code, silent, publisher).await {
            Ok(()) => ExecutionOutcome::Ok,
            Err(failure) => {
                warn!(
                    execution_count,
                    "{} at {}: {}",
                    failure.error.category(),
                    failure.site,
                    failure.error.message()
                );
                let report = self.error_report(&failure);
                if let Err(e) = publisher.publish(Message::Error(report.clone())).await {
                    error!("Failed to publish error notification: {e}");
                }
                ExecutionOutcome::Error(report)
            }
        };

        ExecuteReply::new(execution_count, outcome)
    }

    async fn run_cell(
        &mut self,
        code: &str,
        silent: bool,
        publisher: &mut dyn Publisher,
    ) -> std::result::Result<(), Failure> {
        for (index, block) in split_blocks(code).iter().enumerate() {
            let block_no = index + 1;
            match block {
                InputBlock::ConnectionDirective(conn_str) => {
                    let target = self.describe_directive(conn_str);
                    self.session
                        .connections_mut()
                        .open_connection(conn_str)
                        .await
                        .map_err(|e| {
                            Failure::at(
                                e,
                                FailureSite::Directive {
                                    block: block_no,
                                    target,
                                },
                            )
                        })?;
                }
                InputBlock::SqlBatch(sql) => {
                    self.run_batch(block_no, sql, silent, publisher).await?;
                }
            }
        }
        Ok(())
    }

    async fn run_batch(
        &self,
        block: usize,
        sql: &str,
        silent: bool,
        publisher: &mut dyn Publisher,
    ) -> std::result::Result<(), Failure> {
        if sql.trim().is_empty() {
            return Ok(());
        }

        let Some(db) = self.session.connections().db() else {
            return Err(Failure::at(
                KernelError::usage(
                    "SQL query before connection; open one with a `!<connection string>;` line",
                ),
                FailureSite::Batch { block },
            ));
        };

        let executor = QueryExecutor::new(db);
        let statements = split_statements(sql, executor.dialect());

        for (index, statement) in statements.iter().enumerate() {
            let site = || FailureSite::Statement {
                block,
                statement: index + 1,
                sql: first_line(statement).to_string(),
            };

            if silent {
                executor
                    .execute(statement)
                    .await
                    .map_err(|e| Failure::at(e, site()))?;
                continue;
            }

            let rendered = executor
                .run_statement(statement)
                .await
                .map_err(|e| Failure::at(e, site()))?;
            if let Some(text) = rendered {
                publisher
                    .publish(Message::Stream(StreamContent::stdout(text)))
                    .await
                    .map_err(|e| {
                        Failure::at(
                            KernelError::internal(format!(
                                "Failed to publish output: {}",
                                e.message()
                            )),
                            site(),
                        )
                    })?;
            }
        }
        Ok(())
    }

    /// Redacted form of a directive's target for tracebacks.
    fn describe_directive(&self, conn_str: &str) -> String {
        let connections = self.session.connections();
        match ConnectionTarget::parse(connections.resolve(conn_str)) {
            Ok(target) => target.display_string(),
            Err(_) => "<unparsable connection string>".to_string(),
        }
    }

    fn error_report(&self, failure: &Failure) -> ErrorReport {
        let report = ErrorReport::from_error(&failure.error);
        match self.traceback {
            TracebackStyle::Short => report,
            TracebackStyle::Full => {
                let connection = self
                    .session
                    .connections()
                    .target()
                    .map(ConnectionTarget::display_string)
                    .unwrap_or_else(|| "none".to_string());
                report.with_detail([
                    format!("  at {}", failure.site),
                    format!("  connection: {connection}"),
                ])
            }
        }
    }
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or("").trim()
}
