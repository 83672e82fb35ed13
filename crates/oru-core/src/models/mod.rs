//! Records extracted from a message
//!
//! - Header (MSH), Patient (PID), Visit (PV1), Order (OBR): singleton records
//!   populated through static binding tables
//! - ObservationResult (OBX): one record per occurrence
//! - Message: the aggregate stored as one document

pub mod header;
pub mod message;
pub mod observation;
pub mod order;
pub mod patient;
pub mod visit;

// Re-exports
pub use header::*;
pub use message::*;
pub use observation::*;
pub use order::*;
pub use patient::*;
pub use visit::*;
