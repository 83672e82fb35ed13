//! Message assembly: raw bytes → [`Message`]
//!
//! Pure and stateless. The singleton records come from one
//! [`StructuredMapper`] pass, the observation results from one
//! [`RepeatingSegmentCollector`] pass.

use crate::collector::{RepeatingSegmentCollector, SkippedOccurrence};
use crate::error::DecodeError;
use crate::mapper::{Mapped, SegmentRecord, StructuredMapper};
use crate::models::{Header, Message, ObservationResult, Order, Patient, Visit};
use crate::segment::SegmentIndex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Diagnostics gathered while decoding one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeReport {
    /// Number of segments in the message
    pub segments: usize,
    /// Singleton segment types that were absent (their records are empty)
    pub absent_segments: Vec<&'static str>,
    /// Repeating occurrences that were skipped
    pub skipped: Vec<SkippedOccurrence>,
}

impl DecodeReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// True when nothing was absent or skipped
    pub fn is_clean(&self) -> bool {
        self.absent_segments.is_empty() && self.skipped.is_empty()
    }

    fn note<R: SegmentRecord>(&mut self, mapped: Mapped<R>) -> R {
        if !mapped.present {
            self.absent_segments.push(R::SEGMENT);
        }
        mapped.record
    }
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} segments", self.segments)?;
        if !self.absent_segments.is_empty() {
            write!(f, ", absent: {}", self.absent_segments.join(", "))?;
        }
        if !self.skipped.is_empty() {
            write!(f, ", {} occurrences skipped", self.skipped.len())?;
        }
        Ok(())
    }
}

/// A decoded message with its diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub message: Message,
    pub report: DecodeReport,
}

/// Composes a [`Message`] from one raw payload
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageAssembler;

impl MessageAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Decode raw message bytes.
    ///
    /// Fails only when there is no header segment (which includes empty
    /// input). Absent singleton segments yield empty records and malformed
    /// observation occurrences are skipped; both are listed in the report.
    pub fn decode(&self, raw: &[u8]) -> Result<Decoded, DecodeError> {
        let index = SegmentIndex::parse(raw);
        self.assemble(&index, raw.len())
    }

    /// Assemble from an already built index
    pub fn assemble(&self, index: &SegmentIndex, byte_len: usize) -> Result<Decoded, DecodeError> {
        if index.header().is_none() {
            return Err(DecodeError::MalformedMessage {
                byte_len,
                segments: index.len(),
                first_tag: index.segments().first().map(|s| s.tag().to_string()),
            });
        }

        let mut report = DecodeReport {
            segments: index.len(),
            ..Default::default()
        };

        let mapper = StructuredMapper::new(index);
        let header = report.note(mapper.map::<Header>());
        let patient = report.note(mapper.map::<Patient>());
        let visit = report.note(mapper.map::<Visit>());
        let order = report.note(mapper.map::<Order>());

        let mut message = Message::new(header, patient, visit, order);

        let collected = RepeatingSegmentCollector::new(index)
            .collect(ObservationResult::SEGMENT, ObservationResult::decode);
        for observation in collected.records {
            message.push_observation(observation);
        }
        report.skipped = collected.skipped;

        debug!(
            "Assembled message {} with {} observations ({})",
            message.header.control_id,
            message.observations().len(),
            report
        );

        Ok(Decoded { message, report })
    }
}
