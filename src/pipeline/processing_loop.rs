//! Message processing loop shared by every input mode.
//!
//! Pulls messages from a [`MessageSource`], runs them through one geo-fixing
//! operator with bounded concurrency, and hands them to a [`MessageSink`] in
//! the order they were received. One message in, one message out.
//!
//! A lookup failure halts the run: the failing message is not emitted, and
//! the error is returned to the caller.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::sink::MessageSink;
use super::source::{MessageSource, SourceEvent};
use crate::config::defaults::PROGRESS_LOG_INTERVAL;
use crate::geofix::{GeoFixError, MessageOperator};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Messages that made it through the operator
    pub processed: u64,
    /// Messages that already carried coordinates
    pub already_located: u64,
    /// Messages that gained coordinates
    pub enriched: u64,
    /// Messages left without coordinates
    pub unresolved: u64,
    /// Messages handed to the sink
    pub emitted: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("message source failed: {0}")]
    Source(anyhow::Error),
    #[error(transparent)]
    Operator(#[from] GeoFixError),
    #[error("message sink failed: {0}")]
    Sink(anyhow::Error),
}

/// Owns everything needed to run one operator over a message stream.
pub struct ProcessingLoop {
    operator: Arc<dyn MessageOperator>,
    concurrency: usize,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    pub fn new(
        operator: Arc<dyn MessageOperator>,
        concurrency: usize,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            operator,
            concurrency: concurrency.max(1),
            cancel_token,
        }
    }

    /// Run until the source is exhausted, cancellation, or the first failure.
    pub async fn run<S, K>(
        &self,
        source: &mut S,
        sink: &mut K,
    ) -> Result<PipelineStats, PipelineError>
    where
        S: MessageSource,
        K: MessageSink,
    {
        info!(
            "Geo-fixing messages from {} with '{}' (concurrency {})",
            source.source_name(),
            self.operator.name(),
            self.concurrency
        );

        let cancel = self.cancel_token.clone();
        let incoming = stream::unfold(Some(source), move |state| {
            let cancel = cancel.clone();
            async move {
                let Some(source) = state else {
                    return None;
                };
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!("[ProcessingLoop] Shutdown signal received");
                        return None;
                    }
                    result = source.next_message() => result,
                };
                match event {
                    Ok(SourceEvent::Message(message)) => Some((Ok(message), Some(source))),
                    Ok(SourceEvent::Eof) => None,
                    // Yield the error once, then end the stream
                    Err(e) => Some((Err(PipelineError::Source(e)), None)),
                }
            }
        });

        let operator = &self.operator;
        let results = incoming
            .map(|item| async move {
                let message = item?;
                let already_located = message.has_coordinates();
                let message = operator.apply(message).await?;
                Ok::<_, PipelineError>((already_located, message))
            })
            .buffered(self.concurrency);
        futures::pin_mut!(results);

        let mut stats = PipelineStats::default();

        while let Some(result) = results.next().await {
            let (already_located, message) = match result {
                Ok(done) => done,
                Err(e) => {
                    error!("[ProcessingLoop] Halting after {} messages: {}", stats.processed, e);
                    if let Err(flush_err) = sink.finish().await {
                        error!("[ProcessingLoop] Failed to flush sink: {}", flush_err);
                    }
                    return Err(e);
                }
            };

            stats.processed += 1;
            if already_located {
                stats.already_located += 1;
            } else if message.has_coordinates() {
                stats.enriched += 1;
            } else {
                stats.unresolved += 1;
            }

            sink.emit(&message).await.map_err(PipelineError::Sink)?;
            stats.emitted += 1;

            if stats.processed % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    "Progress: {} messages | enriched: {} | unresolved: {}",
                    stats.processed, stats.enriched, stats.unresolved
                );
            }
        }

        sink.finish().await.map_err(PipelineError::Sink)?;
        log_stats(&stats);

        Ok(stats)
    }
}

fn log_stats(stats: &PipelineStats) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("FINAL STATISTICS");
    info!("   Messages Processed:   {}", stats.processed);
    info!("   Already Located:      {}", stats.already_located);
    info!("   Enriched:             {}", stats.enriched);
    info!("   Unresolved:           {}", stats.unresolved);
    info!("   Emitted:              {}", stats.emitted);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
