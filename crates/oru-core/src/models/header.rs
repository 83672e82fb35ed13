//! Message header (MSH)

use crate::mapper::{Binding, SegmentRecord};
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};

/// Message-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Sending application
    pub app: String,
    /// Sending facility
    pub facility: String,
    pub timestamp: String,
    /// Correlation value used by the sender to track acknowledgment
    pub control_id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub version: String,
}

const BINDINGS: &[Binding<Header>] = &[
    Binding {
        attribute: "app",
        path: FieldPath::field("MSH", 3),
        apply: |h, v| h.app = v.to_string(),
    },
    Binding {
        attribute: "facility",
        path: FieldPath::field("MSH", 4),
        apply: |h, v| h.facility = v.to_string(),
    },
    Binding {
        attribute: "timestamp",
        path: FieldPath::field("MSH", 7),
        apply: |h, v| h.timestamp = v.to_string(),
    },
    Binding {
        attribute: "controlId",
        path: FieldPath::component("MSH", 9, 2),
        apply: |h, v| h.control_id = v.to_string(),
    },
    Binding {
        attribute: "type",
        path: FieldPath::field("MSH", 10),
        apply: |h, v| h.message_type = v.to_string(),
    },
    Binding {
        attribute: "version",
        path: FieldPath::field("MSH", 12),
        apply: |h, v| h.version = v.to_string(),
    },
];

impl SegmentRecord for Header {
    const SEGMENT: &'static str = "MSH";

    fn bindings() -> &'static [Binding<Self>] {
        BINDINGS
    }
}
