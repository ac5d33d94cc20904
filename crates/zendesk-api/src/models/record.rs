//! Loosely-typed ticket record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Role;

/// Prefix marking synthetic fields added by the harvester.
pub const INTERNAL_PREFIX: &str = "_";

/// Field holding the role tag stamped on every harvested record.
pub const ROLE_FIELD: &str = "_role";

/// A single ticket (or search hit) as returned by the API.
///
/// Field order is preserved from the payload. Access is always
/// get-or-default: a missing field reads as absent, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns true if `name` is a synthetic annotation rather than API data.
    pub fn is_internal_field(name: &str) -> bool {
        name.starts_with(INTERNAL_PREFIX)
    }

    /// Returns the raw value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns a field rendered as text, or an empty string when absent.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(value_text).unwrap_or_default()
    }

    /// Returns the string form of a field only when it is a JSON string.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns the value of a custom field by its numeric id.
    ///
    /// Zendesk reports custom fields as `[{"id": .., "value": ..}, ..]`; ids
    /// may arrive as numbers or digit strings.
    pub fn custom_field(&self, id: u64) -> Option<&Value> {
        self.get("custom_fields")?
            .as_array()?
            .iter()
            .find(|field| field.get("id").and_then(numeric_id) == Some(id))
            .and_then(|field| field.get("value"))
    }

    /// Returns a custom field rendered as text, or an empty string.
    pub fn custom_text(&self, id: u64) -> String {
        self.custom_field(id).map(value_text).unwrap_or_default()
    }

    /// Returns the ticket tags rendered as text.
    pub fn tags(&self) -> Vec<String> {
        self.get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().map(value_text).collect())
            .unwrap_or_default()
    }

    /// Stamps the role tag (an internal field) on this record.
    pub fn stamp_role(&mut self, role: Role) {
        self.0
            .insert(ROLE_FIELD.to_string(), Value::String(role.as_str().to_string()));
    }

    /// Returns the role tag, if stamped.
    pub fn role(&self) -> Option<&str> {
        self.str_field(ROLE_FIELD)
    }

    /// Iterates over real API fields, skipping internal annotations.
    pub fn public_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(k, _)| !Self::is_internal_field(k))
    }

    /// Returns the number of fields, including internal ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Renders a JSON value as text for matching and output.
///
/// Strings are returned verbatim, numbers in JSON form, booleans as
/// `true`/`false`, null as an empty string and nested values as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn numeric_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
