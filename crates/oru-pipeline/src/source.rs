//! Message source abstraction (the queue side of the pipeline)

use async_trait::async_trait;
use oru_core::Result;

/// One raw payload read from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    /// Position of the message in its topic
    pub offset: u64,
    pub payload: Vec<u8>,
}

/// A queue that hands out raw payloads one at a time
///
/// `poll` never blocks waiting for new data: it returns `None` when the
/// source is drained, and the caller decides how long to wait.
#[async_trait]
pub trait MessageSource: Send {
    /// Next message after the last one returned, if any
    async fn poll(&mut self) -> Result<Option<SourceMessage>>;

    /// Mark everything up to and including `offset` as consumed
    async fn commit(&mut self, offset: u64) -> Result<()>;
}
