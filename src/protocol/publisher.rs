//! Output channels the kernel publishes notifications on.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{KernelError, Result};

use super::messages::Message;

/// Side channel for notifications emitted while a request is processed.
#[async_trait]
pub trait Publisher: Send {
    /// Delivers one message to the host.
    async fn publish(&mut self, message: Message) -> Result<()>;
}

/// Collects messages in memory.
#[async_trait]
impl Publisher for Vec<Message> {
    async fn publish(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Writes each message as one JSON line.
pub struct JsonLinePublisher<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinePublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Publisher for JsonLinePublisher<W> {
    async fn publish(&mut self, message: Message) -> Result<()> {
        let mut line = serde_json::to_string(&message)
            .map_err(|e| KernelError::internal(format!("Failed to encode message: {e}")))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Writes stream text and error tracebacks as plain text.
///
/// Used when running a script from the command line: stream text goes to
/// `out`, tracebacks to `err`. Replies are not printed.
pub struct ConsolePublisher<O, E> {
    out: O,
    err: E,
}

impl<O, E> ConsolePublisher<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    /// Returns the underlying writers.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

#[async_trait]
impl<O, E> Publisher for ConsolePublisher<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    async fn publish(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Stream(stream) => {
                self.out.write_all(stream.text.as_bytes()).await?;
                self.out.flush().await?;
            }
            Message::Error(report) => {
                for line in &report.traceback {
                    self.err.write_all(line.as_bytes()).await?;
                    self.err.write_all(b"\n").await?;
                }
                self.err.flush().await?;
            }
            _ => {}
        }
        Ok(())
    }
}
