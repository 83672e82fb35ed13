//! ORU Core
//!
//! Decoding engine for pipe-delimited HL7 v2 ORU messages.
//! This crate turns one raw message into a structured [`Message`] document:
//! segment splitting, declarative field bindings for singleton segments,
//! per-occurrence decoding of repeating observation results, plus the
//! configuration shared by the ingestion pipeline and the CLI.

pub mod assembler;
pub mod collector;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod path;
pub mod result;
pub mod segment;

// Re-export commonly used types
pub use assembler::{DecodeReport, Decoded, MessageAssembler};
pub use collector::{Collected, RepeatingSegmentCollector, SkippedOccurrence};
// Configuration system
pub use config::{
    ConfigLoader, ConfigOverrides, LogFormat, LoggingConfiguration, OruConfig,
    ProducerConfiguration, SourceConfiguration, StoreConfiguration,
};
pub use error::{DecodeError, ErrorKind, OccurrenceError, OruError};
pub use mapper::{Binding, Mapped, SegmentRecord, StructuredMapper};
pub use models::{Header, Message, ObservationResult, Order, Patient, Visit};
pub use path::{Component, FieldPath, PathQuery};
pub use result::{Result, ResultExt};
pub use segment::{Delimiters, HEADER_SEGMENT, Segment, SegmentIndex};

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` takes precedence over `filter`.
pub fn init_tracing(filter: &str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("oru=info"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
