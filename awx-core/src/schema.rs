//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource and data source type, enabling
//! validation of manifest attributes before any remote call is made.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values, matched case-insensitively)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v.eq_ignore_ascii_case(s)) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Attribute '{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Server-assigned; never accepted from configuration, never sent in payloads
    pub computed: bool,
    /// Computed, but the user may also supply it (e.g. a lookup key)
    pub optional_computed: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Attributes that must not be set together with this one
    pub conflicts_with: Vec<String>,
    /// Changing this attribute requires replacing the remote record
    pub force_new: bool,
    /// Canonical form the remote system stores the value in
    pub normalize: Option<fn(&Value) -> Value>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            optional_computed: false,
            default: None,
            description: None,
            conflicts_with: Vec::new(),
            force_new: false,
            normalize: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn optional_computed(mut self) -> Self {
        self.optional_computed = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn conflicts_with(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn with_normalizer(mut self, normalize: fn(&Value) -> Value) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// Whether a value counts as "set" for conflict purposes: present and
    /// different from both the declared default and the empty value.
    fn is_set(&self, value: &Value) -> bool {
        if self.default.as_ref() == Some(value) {
            return false;
        }
        match value {
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Bool(b) => *b,
            Value::Int(_) => true,
        }
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Attribute names in a stable order
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        for name in self.attribute_names() {
            let schema = &self.attributes[name];
            if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired {
                    name: name.to_string(),
                });
            }
        }

        let mut names: Vec<&String> = attributes.keys().collect();
        names.sort_unstable();

        // Type check each attribute
        for name in names {
            let value = &attributes[name];
            let Some(schema) = self.attributes.get(name) else {
                errors.push(TypeError::UnknownAttribute { name: name.clone() });
                continue;
            };
            if schema.computed && !schema.optional_computed {
                errors.push(TypeError::ComputedAttribute { name: name.clone() });
                continue;
            }
            if let Err(e) = schema.attr_type.validate(value) {
                errors.push(e);
                continue;
            }
            if !schema.is_set(value) {
                continue;
            }
            for other in &schema.conflicts_with {
                if let (Some(other_value), Some(other_schema)) =
                    (attributes.get(other), self.attributes.get(other))
                    && other_schema.is_set(other_value)
                {
                    errors.push(TypeError::Conflict {
                        name: name.clone(),
                        other: other.clone(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Return a copy of `attributes` with declared defaults filled in for
    /// every absent, non-computed attribute.
    pub fn with_defaults(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        let mut merged = attributes.clone();
        for (name, schema) in &self.attributes {
            if schema.computed {
                continue;
            }
            if let Some(default) = &schema.default {
                merged
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        merged
    }

    /// Return a copy of `attributes` with each value in the form the remote
    /// system stores it, so desired values compare equal to read-back ones.
    pub fn normalize(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        attributes
            .iter()
            .map(|(name, value)| {
                let value = match self.attributes.get(name).and_then(|a| a.normalize) {
                    Some(normalize) => normalize(value),
                    None => value.clone(),
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Names of attributes that force replacement when changed
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Non-negative integer type
    pub fn non_negative_int() -> AttributeType {
        AttributeType::Custom {
            name: "NonNegativeInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if *n >= 0 => Ok(()),
                Value::Int(_) => Err("Value must not be negative".to_string()),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// List of integer identifiers
    pub fn id_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::Int))
    }

    /// Identifier carried as a string; empty means "no reference"
    pub fn id_string() -> AttributeType {
        AttributeType::Custom {
            name: "IdString".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if s.is_empty() || s.parse::<i64>().is_ok() => Ok(()),
                Value::String(s) => Err(format!("'{}' is not a numeric identifier", s)),
                _ => Err("Expected string".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type_ignores_case() {
        let t = AttributeType::Enum(vec!["run".to_string(), "check".to_string()]);
        assert!(t.validate(&Value::String("run".to_string())).is_ok());
        assert!(t.validate(&Value::String("CHECK".to_string())).is_ok());
        assert!(t.validate(&Value::String("scan".to_string())).is_err());
    }

    #[test]
    fn validate_non_negative_int() {
        let t = types::non_negative_int();
        assert!(t.validate(&Value::Int(0)).is_ok());
        assert!(t.validate(&Value::Int(100)).is_ok());
        assert!(t.validate(&Value::Int(-1)).is_err());
        assert!(t.validate(&Value::Bool(true)).is_err());
    }

    #[test]
    fn validate_id_string() {
        let t = types::id_string();
        assert!(t.validate(&Value::String("12".to_string())).is_ok());
        assert!(t.validate(&Value::String(String::new())).is_ok());
        assert!(t.validate(&Value::String("twelve".to_string())).is_err());
    }

    fn group_schema() -> ResourceSchema {
        ResourceSchema::new("inventory_group")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String).with_default(""))
            .attribute(AttributeSchema::new("id", AttributeType::Int).computed())
            .attribute(
                AttributeSchema::new("inventory_id", types::id_string())
                    .conflicts_with("ask_inventory"),
            )
            .attribute(AttributeSchema::new("ask_inventory", AttributeType::Bool).with_default(false))
            .attribute(AttributeSchema::new("children", types::id_list()))
    }

    #[test]
    fn validate_resource_schema() {
        let schema = group_schema();

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));
        attrs.insert(
            "children".to_string(),
            Value::List(vec![Value::Int(7), Value::Int(8)]),
        );

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = group_schema();
        let errors = schema.validate(&HashMap::new()).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::MissingRequired {
                name: "name".to_string()
            }]
        );
    }

    #[test]
    fn computed_and_unknown_attributes_are_rejected() {
        let schema = group_schema();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));
        attrs.insert("id".to_string(), Value::Int(4));
        attrs.insert("colour".to_string(), Value::String("red".to_string()));

        let errors = schema.validate(&attrs).unwrap_err();
        assert!(errors.contains(&TypeError::ComputedAttribute {
            name: "id".to_string()
        }));
        assert!(errors.contains(&TypeError::UnknownAttribute {
            name: "colour".to_string()
        }));
    }

    #[test]
    fn conflicting_attributes() {
        let schema = group_schema();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));
        attrs.insert("inventory_id".to_string(), Value::String("3".to_string()));
        attrs.insert("ask_inventory".to_string(), Value::Bool(true));

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(
            errors,
            vec![TypeError::Conflict {
                name: "inventory_id".to_string(),
                other: "ask_inventory".to_string()
            }]
        );

        // A default-valued flag does not count as set
        attrs.insert("ask_inventory".to_string(), Value::Bool(false));
        assert!(schema.validate(&attrs).is_ok());

        // Nor does a cleared reference
        attrs.insert("ask_inventory".to_string(), Value::Bool(true));
        attrs.insert("inventory_id".to_string(), Value::String(String::new()));
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn defaults_are_filled_in() {
        let schema = group_schema();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));

        let merged = schema.with_defaults(&attrs);
        assert_eq!(
            merged.get("description"),
            Some(&Value::String(String::new()))
        );
        assert_eq!(merged.get("ask_inventory"), Some(&Value::Bool(false)));
        assert!(!merged.contains_key("id"));
        assert!(!merged.contains_key("inventory_id"));
    }

    #[test]
    fn normalizers_apply_only_where_declared() {
        let schema = ResourceSchema::new("job_template")
            .attribute(
                AttributeSchema::new("job_type", AttributeType::String).with_normalizer(|v| {
                    match v {
                        Value::String(s) => Value::String(s.to_ascii_lowercase()),
                        other => other.clone(),
                    }
                }),
            )
            .attribute(AttributeSchema::new("name", AttributeType::String));

        let mut attrs = HashMap::new();
        attrs.insert("job_type".to_string(), Value::String("Run".to_string()));
        attrs.insert("name".to_string(), Value::String("Deploy".to_string()));

        let normalized = schema.normalize(&attrs);
        assert_eq!(normalized["job_type"], Value::String("run".to_string()));
        assert_eq!(normalized["name"], Value::String("Deploy".to_string()));
    }
}
