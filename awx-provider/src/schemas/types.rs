//! AWX-specific type definitions

use awx_core::resource::Value;
use awx_core::schema::AttributeType;

use crate::utils::normalize_json_yaml;

/// Job types accepted by AWX
pub const JOB_TYPES: &[&str] = &["run", "check", "scan"];

/// Job type: run, check or scan (case-insensitive)
pub fn job_type() -> AttributeType {
    AttributeType::Enum(JOB_TYPES.iter().map(|s| s.to_string()).collect())
}

/// AWX stores job types lowercase
pub fn lowercase(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_ascii_lowercase()),
        other => other.clone(),
    }
}

/// Variables documents as AWX hands them back
pub fn json_yaml(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_json_yaml(s)),
        other => other.clone(),
    }
}

/// Ansible verbosity level, 0 (normal) through 5 (connection debug)
pub fn verbosity() -> AttributeType {
    AttributeType::Custom {
        name: "Verbosity".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| match value {
            Value::Int(n) if (0..=5).contains(n) => Ok(()),
            Value::Int(n) => Err(format!("Verbosity {} is out of range, expected 0-5", n)),
            _ => Err("Expected integer".to_string()),
        },
    }
}

/// Survey questions: a list of string maps
pub fn survey_spec() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::String))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_is_case_insensitive() {
        let t = job_type();
        assert!(t.validate(&Value::String("Run".to_string())).is_ok());
        assert!(t.validate(&Value::String("check".to_string())).is_ok());
        assert!(t.validate(&Value::String("deploy".to_string())).is_err());
    }

    #[test]
    fn normalizers_leave_other_types_alone() {
        assert_eq!(lowercase(&Value::String("Check".to_string())), Value::String("check".to_string()));
        assert_eq!(
            json_yaml(&Value::String("{ \"http_port\" : 80 }".to_string())),
            Value::String("{\"http_port\":80}".to_string())
        );
        assert_eq!(lowercase(&Value::Int(3)), Value::Int(3));
    }

    #[test]
    fn verbosity_range() {
        let t = verbosity();
        assert!(t.validate(&Value::Int(0)).is_ok());
        assert!(t.validate(&Value::Int(5)).is_ok());
        assert!(t.validate(&Value::Int(6)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
        assert!(t.validate(&Value::String("3".to_string())).is_err());
    }
}
