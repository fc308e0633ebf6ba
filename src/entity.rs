//! Opaque entity records exchanged with the REST backend.
//!
//! Business entities (contacts, payments, plans, ...) are treated as JSON
//! objects with a stable identifier. The backend may name the identifier
//! `id` or `_id`; both are accepted on input and `id` is written on output.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{CasebookError, Result};

/// Stable identifier of an entity record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One business object as returned by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    id: EntityId,
    attributes: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(id: impl Into<EntityId>, attributes: Map<String, Value>) -> Self {
        let mut attributes = attributes;
        attributes.remove("id");
        attributes.remove("_id");
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Build a record from a JSON object carrying `id` or `_id`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(CasebookError::InvalidValue(
                "entity record must be a JSON object".to_string(),
            ));
        };

        let raw_id = object
            .remove("id")
            .or_else(|| object.remove("_id"))
            .ok_or_else(|| {
                CasebookError::InvalidValue("entity record has no 'id' or '_id'".to_string())
            })?;
        object.remove("_id");

        let id = match raw_id {
            Value::String(s) if !s.is_empty() => s,
            Value::Number(n) => n.to_string(),
            other => {
                return Err(CasebookError::InvalidValue(format!(
                    "unsupported entity id {other}"
                )));
            }
        };

        Ok(Self {
            id: EntityId(id),
            attributes: object,
        })
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// String value of a field, ignoring blanks and non-strings
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.attributes
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }

    /// Fields of `values` that differ from this record's attributes.
    pub fn changed_fields(&self, values: &Map<String, Value>) -> Map<String, Value> {
        values
            .iter()
            .filter(|(key, value)| {
                key.as_str() != "id"
                    && key.as_str() != "_id"
                    && self.attributes.get(key.as_str()) != Some(*value)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Serialize for EntityRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut object = self.attributes.clone();
        object.insert("id".to_string(), Value::String(self.id.0.clone()));
        object.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntityRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        EntityRecord::from_value(value).map_err(D::Error::custom)
    }
}
