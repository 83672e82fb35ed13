//! Field paths and their resolution against segments
//!
//! A [`FieldPath`] is a declarative coordinate `SEG.field[.component]`:
//! 1-based field position, 0-based component position. Resolution never
//! fails; anything out of range resolves to the empty string.

use crate::error::OruError;
use crate::segment::{Delimiters, Segment, SegmentIndex};
use std::fmt;
use std::str::FromStr;

/// Component addressed inside a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// The whole field, verbatim
    Whole,
    /// One component; empty when the field has fewer components
    At(usize),
    /// One component, falling back to the first component when the field
    /// has fewer components (coded elements that only carry an identifier)
    AtOrFirst(usize),
}

/// Coordinate of a value inside a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub segment: &'static str,
    pub field: usize,
    pub component: Component,
}

impl FieldPath {
    /// Path to a whole field
    pub const fn field(segment: &'static str, field: usize) -> Self {
        Self {
            segment,
            field,
            component: Component::Whole,
        }
    }

    /// Path to one component of a field
    pub const fn component(segment: &'static str, field: usize, component: usize) -> Self {
        Self {
            segment,
            field,
            component: Component::At(component),
        }
    }

    /// Path to one component of a coded field, falling back to its first component
    pub const fn component_or_first(
        segment: &'static str,
        field: usize,
        component: usize,
    ) -> Self {
        Self {
            segment,
            field,
            component: Component::AtOrFirst(component),
        }
    }

    /// Resolve against one segment
    pub fn resolve<'a>(&self, segment: &'a Segment, delimiters: &Delimiters) -> &'a str {
        resolve(segment, self.field, self.component, delimiters)
    }
}

/// Resolve a field/component address against a segment.
///
/// Field 0 is the tag. Values are returned verbatim, without unescaping.
pub fn resolve<'a>(
    segment: &'a Segment,
    field: usize,
    component: Component,
    delimiters: &Delimiters,
) -> &'a str {
    let Some(value) = segment.field(field) else {
        return "";
    };

    match component {
        Component::Whole => value,
        Component::At(index) => value.split(delimiters.component).nth(index).unwrap_or(""),
        Component::AtOrFirst(index) => {
            let mut parts = value.split(delimiters.component);
            let first = parts.next().unwrap_or("");
            if index == 0 {
                first
            } else {
                parts.nth(index - 1).unwrap_or(first)
            }
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.segment, self.field)?;
        match self.component {
            Component::Whole => Ok(()),
            Component::At(index) | Component::AtOrFirst(index) => write!(f, ".{index}"),
        }
    }
}

/// Owned, parsed form of a textual path such as `PID.5.1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathQuery {
    pub segment: String,
    pub field: usize,
    pub component: Component,
}

impl FromStr for PathQuery {
    type Err = OruError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let segment = parts.next().unwrap_or_default();
        if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(OruError::invalid_path(s, "expected a segment tag such as PID"));
        }

        let field = match parts.next() {
            Some(field) => field
                .parse::<usize>()
                .map_err(|_| OruError::invalid_path(s, format!("'{field}' is not a field number")))?,
            None => return Err(OruError::invalid_path(s, "missing field number")),
        };

        let component = match parts.next() {
            Some(component) => Component::At(component.parse::<usize>().map_err(|_| {
                OruError::invalid_path(s, format!("'{component}' is not a component number"))
            })?),
            None => Component::Whole,
        };

        if parts.next().is_some() {
            return Err(OruError::invalid_path(
                s,
                "subcomponents are not supported",
            ));
        }

        Ok(Self {
            segment: segment.to_string(),
            field,
            component,
        })
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.segment, self.field)?;
        match self.component {
            Component::Whole => Ok(()),
            Component::At(index) | Component::AtOrFirst(index) => write!(f, ".{index}"),
        }
    }
}

impl SegmentIndex {
    /// Resolve a path against the first matching segment
    pub fn find(&self, query: &PathQuery) -> Option<&str> {
        self.first(&query.segment)
            .map(|segment| resolve(segment, query.field, query.component, self.delimiters()))
    }

    /// Resolve a path against every matching segment, in message order
    pub fn find_all<'a>(&'a self, query: &'a PathQuery) -> Vec<&'a str> {
        self.all(&query.segment)
            .map(|segment| resolve(segment, query.field, query.component, self.delimiters()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SegmentIndex {
        SegmentIndex::parse(
            b"MSH|^~\\&|APP|FAC\rPID|1||||Doe^Jane\rPV1||I|ICU^2\rOBR|1|||PANEL\rOBX|1|NM\rOBX|2|ST",
        )
    }

    #[test]
    fn test_resolve_whole_field() {
        let index = index();
        let pid = index.first("PID").unwrap();
        let path = FieldPath::field("PID", 5);
        assert_eq!(path.resolve(pid, index.delimiters()), "Doe^Jane");
    }

    #[test]
    fn test_resolve_components() {
        let index = index();
        let pid = index.first("PID").unwrap();
        let d = index.delimiters();
        assert_eq!(FieldPath::component("PID", 5, 0).resolve(pid, d), "Doe");
        assert_eq!(FieldPath::component("PID", 5, 1).resolve(pid, d), "Jane");
        assert_eq!(FieldPath::component("PID", 5, 2).resolve(pid, d), "");
    }

    #[test]
    fn test_resolve_out_of_range_field() {
        let index = index();
        let pid = index.first("PID").unwrap();
        let d = index.delimiters();
        assert_eq!(FieldPath::field("PID", 40).resolve(pid, d), "");
        assert_eq!(FieldPath::component("PID", 40, 1).resolve(pid, d), "");
    }

    #[test]
    fn test_resolve_field_zero_is_tag() {
        let index = index();
        let pv1 = index.first("PV1").unwrap();
        assert_eq!(FieldPath::field("PV1", 0).resolve(pv1, index.delimiters()), "PV1");
    }

    #[test]
    fn test_component_or_first_fallback() {
        let index = index();
        let d = index.delimiters();
        let pv1 = index.first("PV1").unwrap();
        let obr = index.first("OBR").unwrap();
        assert_eq!(FieldPath::component_or_first("PV1", 3, 1).resolve(pv1, d), "2");
        assert_eq!(FieldPath::component_or_first("PV1", 3, 2).resolve(pv1, d), "ICU");
        assert_eq!(FieldPath::component_or_first("OBR", 4, 1).resolve(obr, d), "PANEL");
        assert_eq!(FieldPath::component_or_first("OBR", 9, 1).resolve(obr, d), "");
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldPath::component("MSH", 9, 2).to_string(), "MSH.9.2");
        assert_eq!(FieldPath::field("OBX", 14).to_string(), "OBX.14");
    }

    #[test]
    fn test_parse_query() {
        let query: PathQuery = "PID.5.1".parse().unwrap();
        assert_eq!(query.segment, "PID");
        assert_eq!(query.field, 5);
        assert_eq!(query.component, Component::At(1));
        assert_eq!(query.to_string(), "PID.5.1");

        let query: PathQuery = "MSH.12".parse().unwrap();
        assert_eq!(query.component, Component::Whole);
    }

    #[test]
    fn test_parse_query_errors() {
        assert!("".parse::<PathQuery>().is_err());
        assert!("PID".parse::<PathQuery>().is_err());
        assert!("PID.x".parse::<PathQuery>().is_err());
        assert!("PID.5.y".parse::<PathQuery>().is_err());
        assert!("PID.5.1.0".parse::<PathQuery>().is_err());
        assert!("P-D.5".parse::<PathQuery>().is_err());
    }

    #[test]
    fn test_find_and_find_all() {
        let index = index();
        let name: PathQuery = "PID.5.1".parse().unwrap();
        assert_eq!(index.find(&name), Some("Jane"));

        let value_type: PathQuery = "OBX.2".parse().unwrap();
        assert_eq!(index.find_all(&value_type), vec!["NM", "ST"]);

        let missing: PathQuery = "NK1.2".parse().unwrap();
        assert_eq!(index.find(&missing), None);
        assert!(index.find_all(&missing).is_empty());
    }
}
