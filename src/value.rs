//! Helpers for loosely typed graph payloads.

use serde_json::Value;

/// Whether a payload value counts as "nothing there": null, false, zero, `""`, `"0"`,
/// or an empty array/object.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    !is_blank(value)
}

/// Render an identifier that may arrive as a JSON string or number.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a numeric identifier that may arrive as a JSON string or number.
pub fn id_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Serde adapter accepting string or numeric ids.
pub(crate) mod string_or_number {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        super::id_string(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("expected string or number id, got {}", value)))
    }
}
