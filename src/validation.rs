//! Structured validation error records.
//!
//! A failed decode produces one [`ErrorRecord`] per violation, shaped as
//! `{"loc": [...], "msg": "...", "type": "..."}`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocItem {
    /// Object property.
    Key(String),
    /// Array index.
    Index(usize),
}

impl fmt::Display for LocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocItem::Key(key) => write!(f, "{}", key),
            LocItem::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required field absent.
    Missing,
    /// Value of the wrong JSON type.
    TypeError,
    /// Field not allowed by the schema.
    ExtraForbidden,
    /// Value present and typed correctly but rejected by a rule.
    ValueError,
    /// Payload is not valid JSON.
    JsonInvalid,
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    /// Path to the offending field, outermost first.
    pub loc: Vec<LocItem>,
    /// Human readable message.
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl ErrorRecord {
    pub fn new(loc: Vec<LocItem>, msg: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind,
        }
    }

    /// Record for a required top-level field that is absent.
    pub fn missing(field: &str) -> Self {
        Self::new(
            vec![LocItem::Key(field.to_string())],
            "Field required",
            ErrorKind::Missing,
        )
    }

    /// Record for a payload that failed to parse as JSON.
    pub fn json_invalid(msg: impl Into<String>) -> Self {
        Self::new(Vec::new(), msg, ErrorKind::JsonInvalid)
    }

    /// Dotted rendering of `loc`, used in logs.
    pub fn path(&self) -> String {
        self.loc
            .iter()
            .map(LocItem::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Non-empty list of validation failures, serialized as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ErrorRecord>);

impl ValidationErrors {
    pub fn records(&self) -> &[ErrorRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_records(self) -> Vec<ErrorRecord> {
        self.0
    }
}

impl From<Vec<ErrorRecord>> for ValidationErrors {
    fn from(records: Vec<ErrorRecord>) -> Self {
        Self(records)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.0.len())?;
        for record in &self.0 {
            write!(f, "; {}: {}", record.path(), record.msg)?;
        }
        Ok(())
    }
}

/// Convert a JSON pointer (`/a/0/b`) into `loc` segments.
///
/// Segments are typed by walking `instance`: a segment that indexes into an
/// array becomes [`LocItem::Index`], anything else a [`LocItem::Key`].
pub(crate) fn loc_from_pointer(pointer: &str, instance: &Value) -> Vec<LocItem> {
    let mut loc = Vec::new();
    let mut current = Some(instance);

    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        match current {
            Some(Value::Array(items)) => match segment.parse::<usize>() {
                Ok(idx) => {
                    current = items.get(idx);
                    loc.push(LocItem::Index(idx));
                }
                Err(_) => {
                    current = None;
                    loc.push(LocItem::Key(segment));
                }
            },
            Some(Value::Object(map)) => {
                current = map.get(&segment);
                loc.push(LocItem::Key(segment));
            }
            _ => {
                current = None;
                loc.push(LocItem::Key(segment));
            }
        }
    }

    loc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_with_type_key() {
        let record = ErrorRecord::missing("age");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"loc": ["age"], "msg": "Field required", "type": "missing"})
        );
    }

    #[test]
    fn test_errors_serialize_as_array() {
        let errors = ValidationErrors::from(vec![
            ErrorRecord::missing("name"),
            ErrorRecord::json_invalid("EOF while parsing"),
        ]);
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["type"], "json_invalid");
    }

    #[test]
    fn test_loc_from_pointer_types_segments() {
        let instance = json!({"pets": [{"name": 1}], "a/b": true});

        let loc = loc_from_pointer("/pets/0/name", &instance);
        assert_eq!(
            loc,
            vec![
                LocItem::Key("pets".to_string()),
                LocItem::Index(0),
                LocItem::Key("name".to_string()),
            ]
        );

        let loc = loc_from_pointer("/a~1b", &instance);
        assert_eq!(loc, vec![LocItem::Key("a/b".to_string())]);

        assert!(loc_from_pointer("", &instance).is_empty());
    }

    #[test]
    fn test_display_lists_paths() {
        let errors = ValidationErrors::from(vec![ErrorRecord::missing("name")]);
        assert_eq!(errors.to_string(), "1 error(s); name: Field required");
    }
}
