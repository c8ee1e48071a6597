//! Host protocol: JSON-lines requests in, notifications and replies out.

pub mod messages;
pub mod publisher;
pub mod server;

pub use messages::{
    ErrorReport, ExecuteReply, ExecuteRequest, ExecutionOutcome, ExecutionStatus, KernelInfo,
    LanguageInfo, Message, Request, StreamContent,
};
pub use publisher::{ConsolePublisher, JsonLinePublisher, Publisher};
pub use server::serve;
