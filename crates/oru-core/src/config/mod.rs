//! Configuration system for oru
//!
//! Configuration is read once at startup and passed explicitly to the
//! pipeline:
//! - TOML (`.orurc.toml`), JSON (`.orurc.json`, `oru.json`) or YAML (`oru.yaml`)
//! - Auto-discovery by traversing up directories; defaults when nothing is found
//! - Overrides from CLI flags and their environment variables
//!
//! ## Example Configuration
//!
//! ```toml
//! [source]
//! spoolDir = "/var/spool/oru"
//! topic = "hl7"
//! groupId = "hl7-ingest"
//! pollIntervalMs = 500
//!
//! [store]
//! dataDir = "/var/lib/oru"
//! database = "Hl7MessagesDatabase"
//! collection = "MessagesCollection"
//!
//! [producer]
//! inputDir = "./msghl7"
//! deliveryChannelCapacity = 64
//! flushTimeoutSecs = 15
//!
//! [logging]
//! filter = "oru=info"
//! format = "text"
//! ```

mod loader;
mod oru_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use oru_config::{
    ConfigOverrides, LogFormat, LoggingConfiguration, OruConfig, ProducerConfiguration,
    SourceConfiguration, StoreConfiguration,
};
