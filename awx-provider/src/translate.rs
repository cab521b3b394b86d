//! Translation between attribute maps and AWX payload fields

use std::collections::HashMap;

use awx_core::provider::{ProviderError, ProviderResult};
use awx_core::resource::Value;
use awx_core::schema::ResourceSchema;
use serde::{Serialize, Serializer};

use crate::api::Payload;

/// Validate attributes against a schema and fill in declared defaults
pub fn validate_attributes(
    schema: &ResourceSchema,
    attributes: &HashMap<String, Value>,
) -> ProviderResult<HashMap<String, Value>> {
    schema.validate(attributes).map_err(|errors| {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        ProviderError::invalid_config(format!(
            "Invalid {} attributes: {}",
            schema.resource_type,
            details.join("; ")
        ))
    })?;
    Ok(schema.with_defaults(attributes))
}

/// Serialize a payload struct into a JSON object
pub fn to_payload<T: Serialize>(value: &T) -> ProviderResult<Payload> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::new(format!(
            "Payload must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(ProviderError::new("Failed to serialize payload").with_cause(e)),
    }
}

/// A foreign-key field as sent to AWX
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Id(i64),
    /// Explicitly no reference; serialized as `null`
    Cleared,
}

impl Reference {
    /// Parse a locally held id string; empty means cleared
    pub fn parse(attribute: &str, raw: &str) -> ProviderResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Reference::Cleared);
        }
        raw.parse::<i64>().map(Reference::Id).map_err(|_| {
            ProviderError::invalid_config(format!(
                "Attribute '{}' must be a numeric id, got '{}'",
                attribute, raw
            ))
        })
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Reference::Id(id) => Some(*id),
            Reference::Cleared => None,
        }
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reference::Id(id) => serializer.serialize_i64(*id),
            Reference::Cleared => serializer.serialize_none(),
        }
    }
}

/// Render a remote reference back into its local string form
pub fn reference_string(id: Option<i64>) -> Value {
    Value::String(id.map(|id| id.to_string()).unwrap_or_default())
}

/// Typed reads over a validated attribute map
///
/// Absent attributes read as the zero value of their type; schema defaults
/// are expected to have been applied already.
pub struct AttributeReader<'a> {
    attributes: &'a HashMap<String, Value>,
}

impl<'a> AttributeReader<'a> {
    pub fn new(attributes: &'a HashMap<String, Value>) -> Self {
        Self { attributes }
    }

    pub fn string(&self, key: &str) -> String {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn int(&self, key: &str) -> i64 {
        self.attributes
            .get(key)
            .and_then(Value::as_int)
            .unwrap_or_default()
    }

    pub fn bool(&self, key: &str) -> bool {
        self.attributes
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }

    pub fn reference(&self, key: &str) -> ProviderResult<Reference> {
        Reference::parse(key, &self.string(key))
    }

    pub fn id_list(&self, key: &str) -> Vec<i64> {
        match self.attributes.get(key) {
            Some(Value::List(items)) => items.iter().filter_map(Value::as_int).collect(),
            _ => Vec::new(),
        }
    }
}
