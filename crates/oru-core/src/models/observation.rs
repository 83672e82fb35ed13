//! Observation result (OBX), one record per occurrence

use crate::error::OccurrenceError;
use crate::segment::{Delimiters, Segment};
use serde::{Deserialize, Serialize};

pub const VALUE_TYPE_FIELD: usize = 2;
pub const IDENTIFIER_FIELD: usize = 3;
pub const SUB_ID_FIELD: usize = 4;
pub const VALUE_FIELD: usize = 5;
pub const UNITS_FIELD: usize = 6;
pub const RESULT_STATUS_FIELD: usize = 11;
pub const DATE_FIELD: usize = 14;

/// Components carried by the identifier and units fields (id, text, coding system)
pub const CODED_COMPONENTS: usize = 3;

/// Highest field an occurrence must carry; the date after it is optional
pub const REQUIRED_FIELDS: usize = RESULT_STATUS_FIELD;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationResult {
    pub value_type: String,
    pub observation_identifier_id: String,
    pub observation_identifier_text: String,
    pub observation_name_of_coding_system: String,
    pub observation_sub_id: String,
    pub observation_value: String,
    pub unit_identifier: String,
    pub unit_text: String,
    pub unit_name_of_coding_system: String,
    pub observation_result_status: String,
    pub obx_date: String,
}

impl ObservationResult {
    pub const SEGMENT: &'static str = "OBX";

    /// Decode one OBX occurrence.
    ///
    /// Fails when a required field position is missing or when the
    /// identifier or units field carries fewer than three components.
    pub fn decode(segment: &Segment, delimiters: &Delimiters) -> Result<Self, OccurrenceError> {
        let available = segment.field_count();
        if available < REQUIRED_FIELDS {
            return Err(OccurrenceError::MissingField {
                segment: segment.tag().to_string(),
                required: REQUIRED_FIELDS,
                available,
            });
        }

        let field = |index: usize| segment.field(index).unwrap_or_default().to_string();
        let [identifier_id, identifier_text, identifier_system] =
            coded(segment, IDENTIFIER_FIELD, delimiters)?;
        let [unit_id, unit_text, unit_system] = coded(segment, UNITS_FIELD, delimiters)?;

        Ok(Self {
            value_type: field(VALUE_TYPE_FIELD),
            observation_identifier_id: identifier_id,
            observation_identifier_text: identifier_text,
            observation_name_of_coding_system: identifier_system,
            observation_sub_id: field(SUB_ID_FIELD),
            observation_value: field(VALUE_FIELD),
            unit_identifier: unit_id,
            unit_text,
            unit_name_of_coding_system: unit_system,
            observation_result_status: field(RESULT_STATUS_FIELD),
            obx_date: observation_date(segment).to_string(),
        })
    }
}

/// Split a coded field into its first three components
fn coded(
    segment: &Segment,
    index: usize,
    delimiters: &Delimiters,
) -> Result<[String; CODED_COMPONENTS], OccurrenceError> {
    let value = segment.field(index).unwrap_or_default();
    let parts: Vec<&str> = value.split(delimiters.component).collect();
    if parts.len() < CODED_COMPONENTS {
        return Err(OccurrenceError::MissingComponents {
            segment: segment.tag().to_string(),
            field: index,
            expected: CODED_COMPONENTS,
            found: parts.len(),
        });
    }

    Ok([
        parts[0].to_string(),
        parts[1].to_string(),
        parts[2].to_string(),
    ])
}

/// OBX.14, or a timestamp in OBX.11 when the occurrence stops there.
///
/// Only an occurrence ending at the status field falls back; OBX.12 and
/// OBX.13 carry their own dates and never stand in for the observation date.
fn observation_date(segment: &Segment) -> &str {
    if let Some(date) = segment.field(DATE_FIELD) {
        return date;
    }
    if segment.field_count() != RESULT_STATUS_FIELD {
        return "";
    }

    segment
        .field(RESULT_STATUS_FIELD)
        .filter(|last| is_timestamp(last))
        .unwrap_or_default()
}

/// HL7 DTM shape: at least `YYYYMMDD`, then digits with optional fraction and offset
fn is_timestamp(value: &str) -> bool {
    value.len() >= 8
        && value.bytes().take(8).all(|b| b.is_ascii_digit())
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentIndex;

    fn decode_line(line: &str) -> Result<ObservationResult, OccurrenceError> {
        let raw = format!("MSH|^~\\&|APP\r{line}");
        let index = SegmentIndex::parse(raw.as_bytes());
        let segment = index.first("OBX").unwrap();
        ObservationResult::decode(segment, index.delimiters())
    }

    #[test]
    fn test_decode_full_occurrence() {
        let obx = decode_line(
            "OBX|1|NM|2345-7^Glucose^LN||182|mg/dL^milligram per deciliter^UCUM|70-99|H|||F|||20240101083000",
        )
        .unwrap();
        assert_eq!(obx.value_type, "NM");
        assert_eq!(obx.observation_identifier_id, "2345-7");
        assert_eq!(obx.observation_identifier_text, "Glucose");
        assert_eq!(obx.observation_name_of_coding_system, "LN");
        assert_eq!(obx.observation_sub_id, "");
        assert_eq!(obx.observation_value, "182");
        assert_eq!(obx.unit_identifier, "mg/dL");
        assert_eq!(obx.unit_text, "milligram per deciliter");
        assert_eq!(obx.unit_name_of_coding_system, "UCUM");
        assert_eq!(obx.observation_result_status, "F");
        assert_eq!(obx.obx_date, "20240101083000");
    }

    #[test]
    fn test_extra_components_are_ignored() {
        let obx = decode_line(
            "OBX|1|NM|GLU^Glucose^LN^G1^Gluc^L|1|95|mg/dL^mg per dL^UCUM|||||F|||20240101",
        )
        .unwrap();
        assert_eq!(obx.observation_identifier_id, "GLU");
        assert_eq!(obx.observation_name_of_coding_system, "LN");
    }

    #[test]
    fn test_identifier_with_too_few_components() {
        let err = decode_line("OBX|1|NM|GLU^Glucose|1|95|mg/dL^mg per dL^UCUM|||||F").unwrap_err();
        assert_eq!(
            err,
            OccurrenceError::MissingComponents {
                segment: "OBX".to_string(),
                field: IDENTIFIER_FIELD,
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn test_units_with_too_few_components() {
        let err = decode_line("OBX|1|NM|GLU^Glucose^LN|1|95|mg/dL|||||F").unwrap_err();
        assert!(matches!(
            err,
            OccurrenceError::MissingComponents {
                field: UNITS_FIELD,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_occurrence() {
        let err = decode_line("OBX|1|NM|GLU^Glucose^LN|1|95").unwrap_err();
        assert_eq!(
            err,
            OccurrenceError::MissingField {
                segment: "OBX".to_string(),
                required: REQUIRED_FIELDS,
                available: 5,
            }
        );
    }

    #[test]
    fn test_date_absent_without_trailing_timestamp() {
        let obx = decode_line("OBX|1|NM|GLU^Glucose^LN|1|95|mg/dL^mg per dL^UCUM|||||F").unwrap();
        assert_eq!(obx.observation_result_status, "F");
        assert_eq!(obx.obx_date, "");
    }

    #[test]
    fn test_date_from_trailing_timestamp() {
        let obx = decode_line(
            "OBX|1|NM|GLU^Glucose^LN|1|95|mg/dL^milligrams per deciliter^LN|70-99||N|F|20240101120500",
        )
        .unwrap();
        assert_eq!(obx.obx_date, "20240101120500");
    }

    #[test]
    fn test_reference_range_date_is_not_the_observation_date() {
        let obx = decode_line("OBX|1|NM|GLU^Glucose^LN|1|95|mg/dL^mg^UCUM|70-99||N||F|20230101")
            .unwrap();
        assert_eq!(obx.observation_result_status, "F");
        assert_eq!(obx.obx_date, "");
    }

    #[test]
    fn test_is_timestamp() {
        assert!(is_timestamp("20240101"));
        assert!(is_timestamp("20240101120500.1234+0100"));
        assert!(!is_timestamp("2024"));
        assert!(!is_timestamp("F"));
        assert!(!is_timestamp("2024010A"));
    }
}
