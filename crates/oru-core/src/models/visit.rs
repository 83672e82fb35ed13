//! Patient visit (PV1)

use crate::mapper::{Binding, SegmentRecord};
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};

/// Encounter the results belong to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub location: String,
    pub account_type: String,
}

const BINDINGS: &[Binding<Visit>] = &[
    // Point-of-care only senders put the unit in the first component.
    Binding {
        attribute: "location",
        path: FieldPath::component_or_first("PV1", 3, 2),
        apply: |e, v| e.location = v.to_string(),
    },
    Binding {
        attribute: "accountType",
        path: FieldPath::field("PV1", 2),
        apply: |e, v| e.account_type = v.to_string(),
    },
];

impl SegmentRecord for Visit {
    const SEGMENT: &'static str = "PV1";

    fn bindings() -> &'static [Binding<Self>] {
        BINDINGS
    }
}
