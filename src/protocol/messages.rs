//! Wire messages exchanged with the host.
//!
//! Every message is one JSON object with a `msg_type` tag and a `content`
//! body. Unit messages omit `content`.

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// A request sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msg_type", content = "content", rename_all = "snake_case")]
pub enum Request {
    ExecuteRequest(ExecuteRequest),
    KernelInfoRequest,
    ShutdownRequest,
}

/// Body of an `execute_request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Raw cell text: connection directives and SQL.
    pub code: String,
    /// Execute without rendering any output.
    #[serde(default)]
    pub silent: bool,
    /// Count assigned by the host. When present, the reply echoes it in
    /// place of the kernel's own counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<u64>,
}

/// A message sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msg_type", content = "content", rename_all = "snake_case")]
pub enum Message {
    Stream(StreamContent),
    Error(ErrorReport),
    ExecuteReply(ExecuteReply),
    KernelInfoReply(KernelInfo),
    ShutdownReply,
}

/// Text written to one of the host's output streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamContent {
    pub name: String,
    pub text: String,
}

impl StreamContent {
    /// Text for the `stdout` stream.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            name: "stdout".to_string(),
            text: text.into(),
        }
    }
}

/// A failure as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Error kind label, e.g. `QueryError`.
    pub ename: String,
    /// Error message.
    pub evalue: String,
    /// Trace lines; the first one always summarizes the error.
    pub traceback: Vec<String>,
}

impl ErrorReport {
    /// Builds a report whose traceback is the single summary line.
    pub fn from_error(error: &KernelError) -> Self {
        let ename = error.ename().to_string();
        let evalue = error.message().to_string();
        let summary = format!("{ename}: {evalue}");
        Self {
            ename,
            evalue,
            traceback: vec![summary],
        }
    }

    /// Appends detail lines after the summary.
    pub fn with_detail(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.traceback.extend(lines);
        self
    }
}

/// Outcome of one execute call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Ok,
    Error(ErrorReport),
}

/// Terminal status of an execute call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Ok,
    Error,
}

/// Terminal reply to an `execute_request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteReply {
    pub status: ExecutionStatus,
    pub execution_count: u64,
    #[serde(flatten)]
    pub error: Option<ErrorReport>,
}

impl ExecuteReply {
    /// Builds the reply for an outcome.
    pub fn new(execution_count: u64, outcome: ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Ok => Self {
                status: ExecutionStatus::Ok,
                execution_count,
                error: None,
            },
            ExecutionOutcome::Error(report) => Self {
                status: ExecutionStatus::Error,
                execution_count,
                error: Some(report),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }

    /// Error kind label, when the call failed.
    pub fn ename(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.ename.as_str())
    }
}

/// Static description of the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelInfo {
    pub implementation: String,
    pub implementation_version: String,
    pub banner: String,
    pub language_version: String,
    pub language_info: LanguageInfo,
}

/// Language metadata advertised to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub mimetype: String,
    pub file_extension: String,
}

impl KernelInfo {
    /// Describes this build of the kernel.
    pub fn current() -> Self {
        let version = env!("CARGO_PKG_VERSION");
        Self {
            implementation: "sql-kernel".to_string(),
            implementation_version: version.to_string(),
            banner: format!("SQL Kernel {version}"),
            language_version: "SQL:2011".to_string(),
            language_info: LanguageInfo {
                name: "sql".to_string(),
                mimetype: "application/octet-stream".to_string(),
                file_extension: ".sql".to_string(),
            },
        }
    }
}
