//! Collector for repeating segments
//!
//! Every occurrence of the repeating tag is decoded independently. A failed
//! occurrence is recorded and skipped; the others still decode, in their
//! original order.

use crate::error::OccurrenceError;
use crate::segment::{Delimiters, Segment, SegmentIndex};
use serde::Serialize;
use tracing::warn;

/// An occurrence that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedOccurrence {
    pub tag: String,
    /// 1-based occurrence number among segments with the same tag
    pub ordinal: usize,
    /// 0-based position of the segment in the message
    pub position: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: OccurrenceError,
}

fn serialize_display<S: serde::Serializer>(
    error: &OccurrenceError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Decoded occurrences plus the ones that were skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedOccurrence>,
}

impl<T> Default for Collected<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

pub struct RepeatingSegmentCollector<'a> {
    index: &'a SegmentIndex,
}

impl<'a> RepeatingSegmentCollector<'a> {
    pub fn new(index: &'a SegmentIndex) -> Self {
        Self { index }
    }

    /// Decode every occurrence of `tag` with `decode`
    pub fn collect<T, F>(&self, tag: &str, decode: F) -> Collected<T>
    where
        F: Fn(&Segment, &Delimiters) -> Result<T, OccurrenceError>,
    {
        let delimiters = self.index.delimiters();
        let mut collected = Collected::default();

        let occurrences = self
            .index
            .segments()
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.tag() == tag);

        for (ordinal, (position, segment)) in occurrences.enumerate() {
            match decode(segment, delimiters) {
                Ok(record) => collected.records.push(record),
                Err(error) => {
                    warn!(
                        "Skipping {} occurrence {} (segment {}): {}",
                        tag,
                        ordinal + 1,
                        position,
                        error
                    );
                    collected.skipped.push(SkippedOccurrence {
                        tag: tag.to_string(),
                        ordinal: ordinal + 1,
                        position,
                        error,
                    });
                }
            }
        }

        collected
    }
}
