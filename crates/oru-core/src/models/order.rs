//! Observation request (OBR)

use crate::mapper::{Binding, SegmentRecord};
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub report_name: String,
}

const BINDINGS: &[Binding<Order>] = &[Binding {
    attribute: "reportName",
    path: FieldPath::component_or_first("OBR", 4, 1),
    apply: |o, v| o.report_name = v.to_string(),
}];

impl SegmentRecord for Order {
    const SEGMENT: &'static str = "OBR";

    fn bindings() -> &'static [Binding<Self>] {
        BINDINGS
    }
}
