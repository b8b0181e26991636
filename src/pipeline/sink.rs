//! Where geo-fixed messages go.

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::types::Message;

/// Downstream consumer of processed messages.
#[async_trait]
pub trait MessageSink: Send {
    async fn emit(&mut self, message: &Message) -> Result<()>;

    /// Flush anything buffered. Called once when the loop ends.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each message as one JSON line.
pub struct JsonLinesSink<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(1024),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<tokio::io::BufWriter<tokio::io::Stdout>> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::BufWriter::new(tokio::io::stdout()))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSink for JsonLinesSink<W> {
    async fn emit(&mut self, message: &Message) -> Result<()> {
        self.buffer.clear();
        serde_json::to_writer(&mut self.buffer, message)?;
        self.buffer.push(b'\n');
        self.writer.write_all(&self.buffer).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Keeps every emitted message in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub messages: Vec<Message>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageSink for CollectSink {
    async fn emit(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
