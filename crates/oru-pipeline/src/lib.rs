//! ORU Pipeline
//!
//! Everything around the decoder: a message source to poll raw payloads
//! from, a document store to persist decoded messages into, the sequential
//! ingestion loop between them, and the producer that publishes files
//! into the queue.

pub mod batch;
pub mod pipeline;
pub mod producer;
pub mod shutdown;
pub mod source;
pub mod spool;
pub mod stats;
pub mod store;

pub use batch::BatchDecoder;
pub use pipeline::{IngestionPipeline, PipelineOptions};
pub use producer::{DeliveryReport, FileProducer};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use source::{MessageSource, SourceMessage};
pub use spool::{SpoolConsumer, SpoolProducer};
pub use stats::{PipelineStats, ProduceStats};
pub use store::{DocumentStore, InsertedId, MemoryStore, NdjsonStore};
