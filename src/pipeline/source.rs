//! Message source abstraction for pipeline ingestion.
//!
//! Provides a unified trait for reading messages from different sources:
//! in-memory replay (tests, embedding) and newline-delimited JSON over any
//! async reader (stdin, files).

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::types::Message;

/// Events produced by a message source.
#[derive(Debug)]
pub enum SourceEvent {
    /// A valid message was read.
    Message(Message),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where messages come from.
///
/// The processing loop calls [`next_message`](MessageSource::next_message)
/// in a select! with cancellation.
#[async_trait]
pub trait MessageSource: Send {
    /// Read the next message from the source.
    ///
    /// Returns `SourceEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable read errors.
    async fn next_message(&mut self) -> Result<SourceEvent>;

    /// Human-readable name for logging (e.g. "memory", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// In-memory source
// ============================================================================

/// Replays pre-loaded messages.
pub struct VecSource {
    messages: std::vec::IntoIter<Message>,
}

impl VecSource {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages: messages.into_iter(),
        }
    }
}

#[async_trait]
impl MessageSource for VecSource {
    async fn next_message(&mut self) -> Result<SourceEvent> {
        Ok(self
            .messages
            .next()
            .map_or(SourceEvent::Eof, SourceEvent::Message))
    }

    fn source_name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// JSON lines source
// ============================================================================

/// Reads JSON-formatted messages, one per line.
///
/// Blank lines are ignored. Lines that are not valid UTF-8, or that do not
/// decode as a message (including ones carrying only half a coordinate
/// pair), are logged and skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    name: String,
    line_buffer: Vec<u8>,
    line_number: u64,
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            line_buffer: Vec::with_capacity(2048),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Number of malformed lines skipped so far.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl JsonLinesSource<tokio::io::BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()), "stdin")
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MessageSource for JsonLinesSource<R> {
    async fn next_message(&mut self) -> Result<SourceEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_until(b'\n', &mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SourceEvent::Eof);
            }
            self.line_number += 1;

            let line = match std::str::from_utf8(&self.line_buffer) {
                Ok(line) => line.trim(),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(
                        "[{}] Skipping non-UTF-8 line {}: {}",
                        self.name,
                        self.line_number,
                        e
                    );
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(message) => return Ok(SourceEvent::Message(message)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(
                        "[{}] Skipping malformed message on line {}: {}",
                        self.name,
                        self.line_number,
                        e
                    );
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
