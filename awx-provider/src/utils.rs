//! Utility functions for value normalization and conversion

/// Normalize group variables so equivalent documents compare equal.
///
/// JSON is re-serialized compactly, a YAML mapping or sequence is
/// re-serialized as YAML, anything else is returned trimmed.
/// e.g., `{ "a" : 1 }` -> `{"a":1}`, `"a:   1\n"` -> `"a: 1\n"`
pub fn normalize_json_yaml(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed)
        && (json.is_object() || json.is_array())
    {
        return json.to_string();
    }

    if let Ok(yaml) = serde_yaml::from_str::<serde_yaml::Value>(trimmed)
        && (yaml.is_mapping() || yaml.is_sequence())
        && let Ok(rendered) = serde_yaml::to_string(&yaml)
    {
        return rendered;
    }

    trimmed.to_string()
}

/// Parse an AWX numeric identifier (e.g., "42" -> 42)
pub fn parse_identifier(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_json() {
        assert_eq!(normalize_json_yaml("{ \"a\" : 1,\n \"b\": [1, 2] }"), "{\"a\":1,\"b\":[1,2]}");
    }

    #[test]
    fn test_normalize_yaml() {
        assert_eq!(normalize_json_yaml("---\nhttp_port:    80\n"), "http_port: 80\n");
        assert_eq!(
            normalize_json_yaml("http_port: 80"),
            normalize_json_yaml("\n\nhttp_port:   80\n")
        );
    }

    #[test]
    fn test_normalize_scalar_and_empty() {
        assert_eq!(normalize_json_yaml("  plain text  "), "plain text");
        assert_eq!(normalize_json_yaml("   "), "");
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("42"), Some(42));
        assert_eq!(parse_identifier(" 7 "), Some(7));
        assert_eq!(parse_identifier("0"), None);
        assert_eq!(parse_identifier("abc"), None);
    }
}
