//! Structured mapping of singleton segments into fixed-shape records
//!
//! Each record type declares a static binding table (attribute → path →
//! setter). The mapper resolves every binding against the *first* segment
//! of the record's type; when that segment is absent the record keeps its
//! default (all-empty) value.

use crate::path::FieldPath;
use crate::segment::SegmentIndex;
use tracing::{debug, trace};

/// One attribute binding of a record type
pub struct Binding<R> {
    /// Attribute name, for diagnostics
    pub attribute: &'static str,
    /// Where the value lives
    pub path: FieldPath,
    /// How the value is stored on the record
    pub apply: fn(&mut R, &str),
}

/// A record populated from the first occurrence of one segment type
pub trait SegmentRecord: Default + Sized + 'static {
    /// Segment type the record is read from
    const SEGMENT: &'static str;

    /// Static binding table
    fn bindings() -> &'static [Binding<Self>];
}

/// Outcome of mapping one record
#[derive(Debug, Clone, PartialEq)]
pub struct Mapped<R> {
    pub record: R,
    /// Whether the source segment was present in the message
    pub present: bool,
}

/// Applies binding tables against a segment index
pub struct StructuredMapper<'a> {
    index: &'a SegmentIndex,
}

impl<'a> StructuredMapper<'a> {
    pub fn new(index: &'a SegmentIndex) -> Self {
        Self { index }
    }

    /// Populate a record from the first segment of its type
    pub fn map<R: SegmentRecord>(&self) -> Mapped<R> {
        let mut record = R::default();

        let Some(segment) = self.index.first(R::SEGMENT) else {
            debug!("Segment {} absent, using empty record", R::SEGMENT);
            return Mapped {
                record,
                present: false,
            };
        };

        let delimiters = self.index.delimiters();
        for binding in R::bindings() {
            debug_assert_eq!(binding.path.segment, R::SEGMENT);
            let value = binding.path.resolve(segment, delimiters);
            trace!("Resolved {} from {}", binding.attribute, binding.path);
            (binding.apply)(&mut record, value);
        }

        Mapped {
            record,
            present: true,
        }
    }
}
