//! JSON-lines request loop.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tracing::{debug, info, warn};

use crate::error::{KernelError, Result};
use crate::kernel::Kernel;

use super::messages::{ErrorReport, Message, Request};
use super::publisher::{JsonLinePublisher, Publisher};

/// Serves requests read line by line from `reader` until a shutdown request
/// or end of input, writing every outbound message to `writer`.
///
/// An execute reply carries the host's `execution_count` when the request
/// supplied one. Unparsable lines are answered with a `ProtocolError` notification. Only a
/// failure to read or write ends the loop early.
pub async fn serve<R, W>(kernel: &mut Kernel, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    let mut publisher = JsonLinePublisher::new(writer);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<Request>(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected request: {e}");
                let error = KernelError::protocol(format!("Invalid request: {e}"));
                publisher
                    .publish(Message::Error(ErrorReport::from_error(&error)))
                    .await?;
                continue;
            }
        };

        match request {
            Request::ExecuteRequest(execute) => {
                let mut reply = kernel
                    .execute(&execute.code, execute.silent, &mut publisher)
                    .await;
                if let Some(count) = execute.execution_count {
                    reply.execution_count = count;
                }
                publisher.publish(Message::ExecuteReply(reply)).await?;
            }
            Request::KernelInfoRequest => {
                debug!("Kernel info requested");
                publisher
                    .publish(Message::KernelInfoReply(kernel.kernel_info()))
                    .await?;
            }
            Request::ShutdownRequest => {
                kernel.shutdown().await;
                publisher.publish(Message::ShutdownReply).await?;
                return Ok(());
            }
        }
    }

    info!("Input closed");
    kernel.shutdown().await;
    Ok(())
}
