//! JSON-object entities
//!
//! REST endpoints hand back collections of JSON objects. `Record` wraps one
//! such object so it can flow through the engine without a bespoke struct.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Entity, RowId, TabviewError, Value};

/// A JSON object row whose id lives in its `id` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// Wrap a JSON object
    pub fn new(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { fields }
    }

    /// Get a field as a typed value. Missing fields read as NULL.
    pub fn get(&self, name: &str) -> Value {
        self.fields
            .get(name)
            .map(Value::from_json)
            .unwrap_or(Value::Null)
    }

    /// Set a field
    pub fn set(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.fields.insert(name.into(), value);
    }

    /// Field names, in key order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Decode a JSON array of objects. Every element must be an object with
    /// a usable `id`, unique within the collection.
    pub fn parse_collection(json: &str) -> crate::Result<Vec<Record>> {
        let records: Vec<Record> = serde_json::from_str(json)?;
        let mut seen = HashSet::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            let id = RowId::from_value(&record.get("id")).ok_or_else(|| {
                TabviewError::InvalidConfig(format!(
                    "record at index {} has no usable 'id' field",
                    position
                ))
            })?;
            if !seen.insert(id.clone()) {
                return Err(TabviewError::InvalidConfig(format!(
                    "record at index {} repeats id {}",
                    position, id
                )));
            }
        }
        Ok(records)
    }
}

impl Entity for Record {
    fn id(&self) -> RowId {
        RowId::from_value(&self.get("id")).unwrap_or_else(|| RowId::Text(String::new()))
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection() {
        let records =
            Record::parse_collection(r#"[{"id": 1, "name": "Ada"}, {"id": "x2", "name": null}]"#)
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), RowId::Int(1));
        assert_eq!(records[1].id(), RowId::from("x2"));
        assert_eq!(records[0].get("name"), Value::from("Ada"));
        assert!(records[1].get("name").is_null());
        assert!(records[1].get("missing").is_null());
    }

    #[test]
    fn test_parse_collection_requires_id() {
        let err = Record::parse_collection(r#"[{"id": 1}, {"name": "no id"}]"#).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_parse_collection_rejects_duplicate_ids() {
        let err = Record::parse_collection(r#"[{"id": 1}, {"id": 2}, {"id": 1}]"#).unwrap_err();
        assert!(err.to_string().contains("index 2 repeats id 1"));

        let records = Record::parse_collection(
            r#"[{"id": 18446744073709551615}, {"id": 18446744073709551614}]"#,
        )
        .unwrap();
        assert_ne!(records[0].id(), records[1].id());
    }

    #[test]
    fn test_parse_collection_rejects_non_objects() {
        assert!(Record::parse_collection("[1, 2]").is_err());
        assert!(Record::parse_collection("{broken").is_err());
    }
}
