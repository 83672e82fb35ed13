//! Publishes the files of a directory to a topic, one message per file
//!
//! Delivery reports travel over a bounded channel to a dedicated reporter
//! task. When the channel is full the publisher waits, so reports never
//! pile up without bound. After the last file the producer waits up to the
//! flush timeout for outstanding reports.

use crate::spool::SpoolProducer;
use crate::stats::ProduceStats;
use oru_core::{OruError, ProducerConfiguration, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Outcome of publishing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub path: PathBuf,
    /// Offset the message was stored at, or why it was not
    pub result: std::result::Result<u64, String>,
}

#[derive(Debug, Default)]
struct Tally {
    delivered: AtomicUsize,
    failed: AtomicUsize,
}

pub struct FileProducer {
    producer: SpoolProducer,
    channel_capacity: usize,
    flush_timeout: Duration,
}

impl FileProducer {
    pub fn new(producer: SpoolProducer, config: &ProducerConfiguration) -> Self {
        Self {
            producer,
            channel_capacity: config.delivery_channel_capacity.max(1),
            flush_timeout: Duration::from_secs(config.flush_timeout_secs),
        }
    }

    /// Regular, non-hidden files directly inside `input_dir`, sorted by name
    pub fn discover(input_dir: &Path) -> Result<Vec<PathBuf>> {
        if !input_dir.is_dir() {
            return Err(OruError::io_error(
                input_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "input directory not found"),
            ));
        }

        let files = WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.into_path())
            .collect();

        Ok(files)
    }

    /// Publish every file of `input_dir`
    pub async fn publish_dir(&self, input_dir: &Path) -> Result<ProduceStats> {
        let start = Instant::now();
        let files = Self::discover(input_dir)?;
        info!(
            "Publishing {} files from {} to topic '{}'",
            files.len(),
            input_dir.display(),
            self.producer.topic()
        );

        let tally = Arc::new(Tally::default());
        let (tx, rx) = mpsc::channel::<DeliveryReport>(self.channel_capacity);
        let reporter = tokio::spawn(report_deliveries(rx, Arc::clone(&tally)));

        let mut sent = 0;
        for path in &files {
            let result = match tokio::fs::read(path).await {
                Ok(payload) => self
                    .producer
                    .publish(&payload)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(format!("read failed: {e}")),
            };

            let report = DeliveryReport {
                path: path.clone(),
                result,
            };
            if tx.send(report).await.is_err() {
                warn!("Delivery reporter stopped, no further files will be published");
                break;
            }
            sent += 1;
        }
        drop(tx);

        match tokio::time::timeout(self.flush_timeout, reporter).await {
            Ok(Ok(())) => debug!("All delivery reports received"),
            Ok(Err(e)) => return Err(OruError::internal_error(format!("delivery reporter failed: {e}"))),
            Err(_) => warn!(
                "Flush timed out after {}s with reports outstanding",
                self.flush_timeout.as_secs()
            ),
        }

        let delivered = tally.delivered.load(Ordering::SeqCst);
        let failed = tally.failed.load(Ordering::SeqCst);
        let stats = ProduceStats {
            files: files.len(),
            delivered,
            failed,
            unreported: sent - delivered - failed,
            elapsed: start.elapsed(),
        };
        info!("Producer finished: {}", stats);
        Ok(stats)
    }
}

async fn report_deliveries(mut rx: mpsc::Receiver<DeliveryReport>, tally: Arc<Tally>) {
    while let Some(report) = rx.recv().await {
        match &report.result {
            Ok(offset) => {
                tally.delivered.fetch_add(1, Ordering::SeqCst);
                info!("Delivered {} at offset {}", report.path.display(), offset);
            }
            Err(e) => {
                tally.failed.fetch_add(1, Ordering::SeqCst);
                error!("Delivery failed for {}: {}", report.path.display(), e);
            }
        }
    }
}
