//! Patient identification (PID)

use crate::mapper::{Binding, SegmentRecord};
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};

/// Subject of the message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Numeric set identifier; 0 when absent or not numeric
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
}

const BINDINGS: &[Binding<Patient>] = &[
    Binding {
        attribute: "id",
        path: FieldPath::field("PID", 1),
        apply: |p, v| p.id = v.trim().parse().unwrap_or_default(),
    },
    Binding {
        attribute: "lastName",
        path: FieldPath::component("PID", 5, 0),
        apply: |p, v| p.last_name = v.to_string(),
    },
    Binding {
        attribute: "firstName",
        path: FieldPath::component("PID", 5, 1),
        apply: |p, v| p.first_name = v.to_string(),
    },
];

impl SegmentRecord for Patient {
    const SEGMENT: &'static str = "PID";

    fn bindings() -> &'static [Binding<Self>] {
        BINDINGS
    }
}
