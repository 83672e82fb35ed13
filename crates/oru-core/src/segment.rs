//! Segment index over a raw pipe-delimited message
//!
//! A message is a sequence of segments terminated by carriage return or
//! newline. Each segment is a run of fields separated by the field separator;
//! the first field is the segment's type tag. The header segment (`MSH`) is
//! special: its field separator is itself MSH.1, so the tag is taken from the
//! first three characters and the separator character is kept as field 1.

use serde::Serialize;
use std::borrow::Cow;
use tracing::debug;

/// Tag of the message header segment
pub const HEADER_SEGMENT: &str = "MSH";

/// Delimiter characters used by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// Read the delimiters declared by a header line (`MSH|^~\&|...`).
    ///
    /// Missing encoding characters fall back to the defaults one by one.
    fn from_header_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(HEADER_SEGMENT)?;
        let mut chars = rest.chars();
        let field = chars.next()?;
        let defaults = Self::default();
        let encoding: Vec<char> = chars.take_while(|c| *c != field).collect();

        Some(Self {
            field,
            component: encoding.first().copied().unwrap_or(defaults.component),
            repetition: encoding.get(1).copied().unwrap_or(defaults.repetition),
            escape: encoding.get(2).copied().unwrap_or(defaults.escape),
            subcomponent: encoding.get(3).copied().unwrap_or(defaults.subcomponent),
        })
    }
}

/// One segment of a message
///
/// `fields[0]` is the type tag, so `field(n)` follows the 1-based field
/// numbering of the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    fields: Vec<String>,
}

impl Segment {
    fn parse(line: &str, delimiters: &Delimiters) -> Self {
        let fields = match line.strip_prefix(HEADER_SEGMENT) {
            Some(rest) if rest.starts_with(delimiters.field) => {
                let mut fields = vec![HEADER_SEGMENT.to_string(), delimiters.field.to_string()];
                fields.extend(
                    rest[delimiters.field.len_utf8()..]
                        .split(delimiters.field)
                        .map(str::to_string),
                );
                fields
            }
            _ => line.split(delimiters.field).map(str::to_string).collect(),
        };

        Self { fields }
    }

    /// Segment type tag (`MSH`, `PID`, `OBX`, ...)
    pub fn tag(&self) -> &str {
        &self.fields[0]
    }

    /// Field at a 1-based position; field 0 is the tag itself
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Highest field position present in this segment
    pub fn field_count(&self) -> usize {
        self.fields.len() - 1
    }
}

/// Ordered index of the segments of one message
///
/// Keeps the original order and duplicate occurrences. Building the index
/// never fails: empty input yields an empty index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentIndex {
    segments: Vec<Segment>,
    delimiters: Delimiters,
}

impl SegmentIndex {
    /// Split raw message bytes into segments.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; many senders still emit
    /// Latin-1 text in free-text fields.
    pub fn parse(raw: &[u8]) -> Self {
        let text: Cow<'_, str> = String::from_utf8_lossy(raw);
        let lines: Vec<&str> = text
            .split(['\r', '\n'])
            .map(str::trim_start)
            .filter(|line| !line.trim_end().is_empty())
            .collect();

        let delimiters = lines
            .iter()
            .find_map(|line| Delimiters::from_header_line(line))
            .unwrap_or_default();

        let segments: Vec<Segment> = lines
            .iter()
            .map(|line| Segment::parse(line, &delimiters))
            .collect();

        debug!(
            "Indexed {} segments from {} bytes",
            segments.len(),
            raw.len()
        );

        Self {
            segments,
            delimiters,
        }
    }

    /// All segments in message order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Delimiters declared by the header (or the defaults)
    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment with the given tag
    pub fn first(&self, tag: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.tag() == tag)
    }

    /// Every segment with the given tag, in message order
    pub fn all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.tag() == tag)
    }

    /// Message header segment, if present
    pub fn header(&self) -> Option<&Segment> {
        self.first(HEADER_SEGMENT)
    }
}
