//! Lenient field access on recovered JSON.
//!
//! Models return numbers as strings, single values where lists were asked
//! for and nulls for missing data. These helpers read what is there and
//! report absence as `None` or empty.

use serde_json::{Map, Value};

/// String field; non-strings (other than numbers) read as empty.
pub fn string(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Non-empty string field.
pub fn opt_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    Some(string(object, key)).filter(|s| !s.is_empty() && s != "null")
}

/// Finite number, also accepting numeric strings.
pub fn number(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match object.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Non-negative integer index, also accepting integral floats and strings.
pub fn index(object: &Map<String, Value>, key: &str) -> Option<usize> {
    index_value(object.get(key)?)
}

/// Interpret a single value as a non-negative integer index.
pub fn index_value(value: &Value) -> Option<usize> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64).then_some(n as usize)
}

/// List of non-empty strings; a lone string counts as a one-item list.
pub fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_accepts_strings() {
        let obj = object(json!({"a": 0.9, "b": "0.4", "c": "high", "d": null}));
        assert_eq!(number(&obj, "a"), Some(0.9));
        assert_eq!(number(&obj, "b"), Some(0.4));
        assert_eq!(number(&obj, "c"), None);
        assert_eq!(number(&obj, "d"), None);
        assert_eq!(number(&obj, "missing"), None);
    }

    #[test]
    fn test_index_rejects_negative_and_fractional() {
        let obj = object(json!({"a": 3, "b": -1, "c": 1.5, "d": "2", "e": 2.0}));
        assert_eq!(index(&obj, "a"), Some(3));
        assert_eq!(index(&obj, "b"), None);
        assert_eq!(index(&obj, "c"), None);
        assert_eq!(index(&obj, "d"), Some(2));
        assert_eq!(index(&obj, "e"), Some(2));
    }

    #[test]
    fn test_string_list_variants() {
        let obj = object(json!({"a": ["x", " ", 3, null], "b": "solo", "c": 5}));
        assert_eq!(string_list(&obj, "a"), vec!["x", "3"]);
        assert_eq!(string_list(&obj, "b"), vec!["solo"]);
        assert!(string_list(&obj, "c").is_empty());
    }

    #[test]
    fn test_opt_string_treats_null_text_as_missing() {
        let obj = object(json!({"a": "null", "b": "2024-01-01", "c": null}));
        assert_eq!(opt_string(&obj, "a"), None);
        assert_eq!(opt_string(&obj, "b").as_deref(), Some("2024-01-01"));
        assert_eq!(opt_string(&obj, "c"), None);
    }
}
