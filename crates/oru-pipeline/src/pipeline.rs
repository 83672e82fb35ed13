//! Sequential ingestion loop: poll, decode, store, commit
//!
//! One message is in flight at a time. A message is committed once it has
//! been handled, whatever the outcome: malformed messages and failed
//! inserts are logged and counted, never retried.

use crate::shutdown::Shutdown;
use crate::source::{MessageSource, SourceMessage};
use crate::stats::PipelineStats;
use crate::store::DocumentStore;
use oru_core::{MessageAssembler, Result, ResultExt, SourceConfiguration};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Loop behaviour
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Wait between polls of a drained source
    pub poll_interval: Duration,
    /// Stop as soon as the source is drained instead of waiting for more
    pub exit_when_idle: bool,
    /// Stop after this many messages
    pub max_messages: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            exit_when_idle: false,
            max_messages: None,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &SourceConfiguration) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            ..Default::default()
        }
    }

    pub fn exit_when_idle(mut self, exit_when_idle: bool) -> Self {
        self.exit_when_idle = exit_when_idle;
        self
    }

    pub fn max_messages(mut self, max_messages: Option<usize>) -> Self {
        self.max_messages = max_messages;
        self
    }
}

/// Feeds payloads from a source through the decoder into a store
pub struct IngestionPipeline<S, D> {
    source: S,
    store: D,
    assembler: MessageAssembler,
    options: PipelineOptions,
}

impl<S: MessageSource, D: DocumentStore> IngestionPipeline<S, D> {
    pub fn new(source: S, store: D, options: PipelineOptions) -> Self {
        Self {
            source,
            store,
            assembler: MessageAssembler::new(),
            options,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Run until shutdown, until the source is drained (with
    /// `exit_when_idle`), or until `max_messages` have been handled.
    ///
    /// Only a failed commit or an unrecoverable poll error ends the run
    /// with an error.
    pub async fn run(&mut self, mut shutdown: Shutdown) -> Result<PipelineStats> {
        let mut stats = PipelineStats::new();
        info!("Ingestion started");

        loop {
            if shutdown.is_triggered() {
                info!("Shutdown requested, stopping ingestion");
                break;
            }
            if self
                .options
                .max_messages
                .is_some_and(|max| stats.received >= max)
            {
                debug!("Reached message limit");
                break;
            }

            let message = match self.source.poll().await.recoverable()? {
                Some(Some(message)) => message,
                Some(None) => {
                    if self.options.exit_when_idle {
                        debug!("Source drained");
                        break;
                    }
                    self.pause(&mut shutdown).await;
                    continue;
                }
                None => {
                    stats.source_errors += 1;
                    self.pause(&mut shutdown).await;
                    continue;
                }
            };

            stats.received += 1;
            self.handle(&message, &mut stats).await;
            self.source.commit(message.offset).await?;
        }

        info!("Ingestion stopped: {}", stats);
        Ok(stats)
    }

    /// Sleep for the poll interval, waking early on shutdown
    async fn pause(&self, shutdown: &mut Shutdown) {
        tokio::select! {
            _ = shutdown.triggered() => {}
            _ = tokio::time::sleep(self.options.poll_interval) => {}
        }
    }

    async fn handle(&self, message: &SourceMessage, stats: &mut PipelineStats) {
        let decoded = match self.assembler.decode(&message.payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                stats.malformed += 1;
                warn!("Dropping message at offset {}: {}", message.offset, e);
                return;
            }
        };

        let skipped = decoded.report.skipped_count();
        if skipped > 0 {
            stats.skipped_occurrences += skipped;
            warn!(
                "Message {} at offset {}: {}",
                decoded.message.header.control_id, message.offset, decoded.report
            );
        }

        match self.store.insert_one(&decoded.message).await {
            Ok(id) => {
                stats.stored += 1;
                info!(
                    "Stored message {} (offset {}) as {} with {} observations",
                    decoded.message.header.control_id,
                    message.offset,
                    id,
                    decoded.message.observations().len()
                );
            }
            Err(e) => {
                stats.store_failures += 1;
                error!("Insert failed for offset {}: {}", message.offset, e);
            }
        }
    }
}
