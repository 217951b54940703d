//! Candidate records returned by application searches.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A record returned by a search, as seen by the matcher.
///
/// Only `id`, `name` and `description` take part in scoring. Every other
/// column the backend returns is kept in `fields` and forwarded untouched.
/// A non-string value in one of the three scored columns reads as empty, so
/// one odd row never fails the whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Opaque identifier, unique per logical record (ServiceNow `sys_id`).
    #[serde(rename = "sys_id", default, deserialize_with = "text_or_empty")]
    pub id: String,

    /// Display name.
    #[serde(default, deserialize_with = "text_or_none")]
    pub name: Option<String>,

    /// Free-text description (ServiceNow `short_description`).
    #[serde(
        rename(serialize = "description", deserialize = "short_description"),
        default,
        deserialize_with = "text_or_none"
    )]
    pub description: Option<String>,

    /// Pass-through columns the matcher does not interpret.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CandidateRecord {
    /// Creates a record with an id and name and no other fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            description: None,
            fields: Map::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a pass-through field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_or_none(deserializer)?.unwrap_or_default())
}
