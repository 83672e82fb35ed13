//! Document stores
//!
//! A store receives one decoded [`Message`] per insert and assigns it an
//! identifier. Documents are write-once.

use async_trait::async_trait;
use oru_core::{Message, OruError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier assigned to an inserted document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InsertedId(String);

impl InsertedId {
    /// Time-ordered UUIDv7 in its 32-digit hex form
    fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InsertedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persists decoded messages
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document
    async fn insert_one(&self, message: &Message) -> Result<InsertedId>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn insert_one(&self, message: &Message) -> Result<InsertedId> {
        self.as_ref().insert_one(message).await
    }
}

#[derive(Serialize)]
struct StoredDocument<'a> {
    #[serde(rename = "_id")]
    id: &'a InsertedId,
    #[serde(flatten)]
    message: &'a Message,
}

/// Appends documents as JSON lines to `<data_dir>/<database>/<collection>.ndjson`
pub struct NdjsonStore {
    path: PathBuf,
    collection: tokio::sync::Mutex<CollectionFile>,
}

struct CollectionFile {
    file: File,
    /// The last write stopped partway through a line
    torn: bool,
}

/// Write one newline-terminated document.
///
/// A torn previous line is terminated first so the new document starts on
/// its own line. `torn` is set again when this write fails.
async fn append_line<W>(writer: &mut W, torn: &mut bool, line: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if *torn {
        writer.write_all(b"\n").await?;
        *torn = false;
    }

    let result = async {
        writer.write_all(line).await?;
        writer.flush().await
    }
    .await;
    if result.is_err() {
        *torn = true;
    }
    result
}

impl NdjsonStore {
    /// Open a collection, creating the database directory and file as needed
    pub async fn open(data_dir: &Path, database: &str, collection: &str) -> Result<Self> {
        let database_dir = data_dir.join(database);
        fs::create_dir_all(&database_dir)
            .await
            .map_err(|e| OruError::io_error(&database_dir, e))?;

        let path = database_dir.join(format!("{collection}.ndjson"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| OruError::io_error(&path, e))?;

        debug!("Opened collection {}", path.display());

        Ok(Self {
            path,
            collection: tokio::sync::Mutex::new(CollectionFile { file, torn: false }),
        })
    }

    /// Path of the collection file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentStore for NdjsonStore {
    async fn insert_one(&self, message: &Message) -> Result<InsertedId> {
        let id = InsertedId::generate();
        let mut line = serde_json::to_vec(&StoredDocument {
            id: &id,
            message,
        })?;
        line.push(b'\n');

        let mut guard = self.collection.lock().await;
        let collection = &mut *guard;
        let was_torn = collection.torn;
        let start = collection.file.metadata().await.map(|m| m.len()).ok();

        if let Err(e) = append_line(&mut collection.file, &mut collection.torn, &line).await {
            // Cut the partial line off; if that fails the next write terminates it
            if let Some(len) = start {
                match collection.file.set_len(len).await {
                    Ok(()) => collection.torn = was_torn,
                    Err(truncate) => warn!(
                        "Could not truncate {} after a failed write: {}",
                        self.path.display(),
                        truncate
                    ),
                }
            }
            return Err(OruError::store_error(format!(
                "write to {} failed: {e}",
                self.path.display()
            )));
        }

        Ok(id)
    }
}

/// In-process store, mainly for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<(InsertedId, Message)>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent inserts fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the stored documents in insertion order
    pub fn documents(&self) -> Vec<(InsertedId, Message)> {
        self.documents
            .lock()
            .map(|documents| documents.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, message: &Message) -> Result<InsertedId> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OruError::store_error("memory store is unavailable"));
        }

        let id = InsertedId::generate();
        self.documents
            .lock()
            .map_err(|_| OruError::internal_error("memory store lock poisoned"))?
            .push((id.clone(), message.clone()));
        Ok(id)
    }
}
