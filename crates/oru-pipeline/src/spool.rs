//! File-system spool queue
//!
//! A topic is a directory of immutable message files named by their
//! zero-padded offset:
//!
//! ```text
//! <spool_dir>/<topic>/00000000000000000000.hl7
//! <spool_dir>/<topic>/00000000000000000001.hl7
//! <spool_dir>/<topic>/.offsets/<group_id>
//! ```
//!
//! Each consumer group stores the next offset it will read. A group with
//! no stored offset starts from the earliest message.
//!
//! Message files below every group's committed offset are purged, except
//! the newest one, which keeps the topic's offset sequence going.

use crate::source::{MessageSource, SourceMessage};
use async_trait::async_trait;
use oru_core::{OruError, Result, ResultExt};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

const MESSAGE_EXTENSION: &str = "hl7";
const OFFSETS_DIR: &str = ".offsets";
/// Commits between two purges of consumed messages
const PURGE_INTERVAL: u64 = 1024;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn message_file_name(offset: u64) -> String {
    format!("{offset:020}.{MESSAGE_EXTENSION}")
}

fn parse_offset(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_suffix(MESSAGE_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

fn temp_path(dir: &Path, prefix: &str) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".{prefix}-{}-{n}.tmp", std::process::id()))
}

fn spool_error(action: &str, path: &Path, err: io::Error) -> OruError {
    OruError::source_error(format!("failed to {action} '{}': {err}", path.display()))
}

/// Offsets present in a topic directory, ascending
async fn list_offsets(dir: &Path) -> Result<Vec<u64>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(spool_error("list", dir, e)),
    };

    let mut offsets = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| spool_error("list", dir, e))?
    {
        if let Some(offset) = entry.file_name().to_str().and_then(parse_offset) {
            offsets.push(offset);
        }
    }

    offsets.sort_unstable();
    Ok(offsets)
}

fn topic_dir(spool_dir: &Path, topic: &str) -> PathBuf {
    spool_dir.join(topic)
}

/// Lowest committed offset across every group of a topic
async fn min_committed(offsets_dir: &Path) -> Result<Option<u64>> {
    let mut entries = match fs::read_dir(offsets_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(spool_error("list", offsets_dir, e)),
    };

    let mut min: Option<u64> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| spool_error("list", offsets_dir, e))?
    {
        // Skip in-progress commits
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| spool_error("read", &path, e))?;
        match content.trim().parse::<u64>() {
            Ok(offset) => min = Some(min.map_or(offset, |m| m.min(offset))),
            // An unreadable group pins the topic until it is repaired
            Err(_) => return Ok(Some(0)),
        }
    }
    Ok(min)
}

/// Appends messages to a topic
#[derive(Debug, Clone)]
pub struct SpoolProducer {
    dir: PathBuf,
    topic: String,
    next_offset: Arc<AtomicU64>,
}

impl SpoolProducer {
    /// Open (and create if needed) a topic for writing
    pub async fn open(spool_dir: &Path, topic: &str) -> Result<Self> {
        let dir = topic_dir(spool_dir, topic);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| spool_error("create topic directory", &dir, e))?;
        let next_offset = list_offsets(&dir).await?.last().map_or(0, |last| last + 1);

        Ok(Self {
            dir,
            topic: topic.to_string(),
            next_offset: Arc::new(AtomicU64::new(next_offset)),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish one payload, returning the offset it was stored at.
    ///
    /// The payload is fully written before it becomes visible under its
    /// offset, so consumers never observe a partial message.
    pub async fn publish(&self, payload: &[u8]) -> Result<u64> {
        let temp = temp_path(&self.dir, "publish");
        fs::write(&temp, payload)
            .await
            .map_err(|e| spool_error("write", &temp, e))?;

        // Another producer may have taken the cached offset; step past it
        let mut offset = self.next_offset.load(Ordering::SeqCst);
        let published = loop {
            let target = self.dir.join(message_file_name(offset));
            match fs::hard_link(&temp, &target).await {
                Ok(()) => {
                    self.next_offset.fetch_max(offset + 1, Ordering::SeqCst);
                    break Ok(offset);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => offset += 1,
                Err(e) => break Err(spool_error("publish", &target, e)),
            }
        };

        if let Err(e) = fs::remove_file(&temp).await {
            warn!("Could not remove temporary file {}: {}", temp.display(), e);
        }

        if let Ok(offset) = published {
            debug!("Published {} bytes to {}@{}", payload.len(), self.topic, offset);
        }
        published
    }
}

/// Reads a topic on behalf of a consumer group
#[derive(Debug)]
pub struct SpoolConsumer {
    dir: PathBuf,
    offsets_dir: PathBuf,
    offsets_file: PathBuf,
    group_id: String,
    position: u64,
}

impl SpoolConsumer {
    /// Subscribe `group_id` to a topic, resuming from its committed offset
    pub async fn open(spool_dir: &Path, topic: &str, group_id: &str) -> Result<Self> {
        let dir = topic_dir(spool_dir, topic);
        let offsets_dir = dir.join(OFFSETS_DIR);
        fs::create_dir_all(&offsets_dir)
            .await
            .map_err(|e| spool_error("create offsets directory", &offsets_dir, e))?;

        let offsets_file = offsets_dir.join(group_id);
        let position = match fs::read_to_string(&offsets_file).await {
            Ok(content) => content.trim().parse::<u64>().map_err(|e| {
                OruError::source_error(format!(
                    "corrupt committed offset in '{}': {e}",
                    offsets_file.display()
                ))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No committed offset for group '{}', starting from earliest", group_id);
                0
            }
            Err(e) => return Err(spool_error("read", &offsets_file, e)),
        };

        info!(
            "Subscribed group '{}' to topic '{}' at offset {}",
            group_id, topic, position
        );

        Ok(Self {
            dir,
            offsets_dir,
            offsets_file,
            group_id: group_id.to_string(),
            position,
        })
    }

    /// Offset of the next message `poll` will look for
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of messages at or after the current position
    pub async fn lag(&self) -> Result<usize> {
        let offsets = list_offsets(&self.dir).await?;
        Ok(offsets.iter().filter(|o| **o >= self.position).count())
    }

    /// Remove message files every group has committed past.
    ///
    /// The newest message file is always kept. Returns the number of files
    /// removed.
    pub async fn purge_consumed(&self) -> Result<usize> {
        let Some(committed) = min_committed(&self.offsets_dir).await? else {
            return Ok(0);
        };
        let offsets = list_offsets(&self.dir).await?;
        let Some(newest) = offsets.last().copied() else {
            return Ok(0);
        };

        let mut removed = 0;
        for offset in offsets.into_iter().take_while(|o| *o < committed.min(newest)) {
            let path = self.dir.join(message_file_name(offset));
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(spool_error("purge", &path, e)),
            }
        }

        if removed > 0 {
            debug!("Purged {} consumed messages below offset {}", removed, committed);
        }
        Ok(removed)
    }

    /// Next offset present at or after the current position
    async fn next_offset(&self) -> Result<Option<u64>> {
        if fs::try_exists(self.dir.join(message_file_name(self.position)))
            .await
            .unwrap_or(false)
        {
            return Ok(Some(self.position));
        }

        // Gap, purged range, or nothing new yet
        Ok(list_offsets(&self.dir)
            .await?
            .into_iter()
            .find(|offset| *offset >= self.position))
    }
}

#[async_trait]
impl MessageSource for SpoolConsumer {
    async fn poll(&mut self) -> Result<Option<SourceMessage>> {
        let Some(offset) = self.next_offset().await? else {
            return Ok(None);
        };

        let path = self.dir.join(message_file_name(offset));
        let payload = fs::read(&path)
            .await
            .map_err(|e| spool_error("read", &path, e))?;
        self.position = offset + 1;

        Ok(Some(SourceMessage { offset, payload }))
    }

    async fn commit(&mut self, offset: u64) -> Result<()> {
        let temp = temp_path(&self.offsets_dir, &self.group_id);
        fs::write(&temp, (offset + 1).to_string())
            .await
            .map_err(|e| spool_error("write", &temp, e))?;
        fs::rename(&temp, &self.offsets_file)
            .await
            .map_err(|e| spool_error("commit", &self.offsets_file, e))?;

        debug!("Committed offset {} for group '{}'", offset, self.group_id);

        if (offset + 1) % PURGE_INTERVAL == 0 {
            self.purge_consumed().await.log_and_continue();
        }
        Ok(())
    }
}
