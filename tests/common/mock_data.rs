//! Builders for test records and form payloads.

use casebook::EntityRecord;
use serde_json::{Map, Value, json};

/// Builder for a test record
pub struct RecordBuilder {
    id: String,
    attributes: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            attributes: Map::new(),
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> EntityRecord {
        EntityRecord::new(self.id.as_str(), self.attributes)
    }
}

/// An active individual contact
pub fn contact(id: &str, first: &str, last: &str) -> EntityRecord {
    RecordBuilder::new(id)
        .field("firstName", first)
        .field("lastName", last)
        .field("type", "individual")
        .field("status", "active")
        .build()
}

/// A few contacts with mixed types and statuses
pub fn sample_contacts() -> Vec<EntityRecord> {
    vec![
        contact("c-1", "Noura", "Al-Harbi"),
        contact("c-2", "Faisal", "Al-Qahtani"),
        RecordBuilder::new("c-3")
            .field("firstName", "Reem")
            .field("lastName", "Al-Saud")
            .field("type", "organization")
            .field("status", "inactive")
            .build(),
        RecordBuilder::new("c-4")
            .field("firstName", "Omar")
            .field("lastName", "Haddad")
            .field("type", "attorney")
            .field("status", "active")
            .field("email", "omar@example.com")
            .build(),
    ]
}

/// `n` contacts named Client 1..=n with ids c-1..=c-n
pub fn numbered_contacts(n: usize) -> Vec<EntityRecord> {
    (1..=n)
        .map(|i| contact(&format!("c-{i}"), "Client", &i.to_string()))
        .collect()
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn valid_contact_payload() -> Map<String, Value> {
    object(json!({
        "firstName": "Layla",
        "lastName": "Mansour",
        "email": "layla@example.com",
        "phone": "0551234567",
    }))
}
