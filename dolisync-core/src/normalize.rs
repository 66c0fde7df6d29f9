//! Comparison keys for diffing.
//!
//! Values are only normalized when compared; what gets written to the
//! remote store is always the raw proposed value.

use serde_json::Value;

/// Normalize an optional JSON scalar into a comparison key.
///
/// Absent and `null` become `""`. Strings are trimmed. Numbers keep their
/// JSON text and booleans become `"1"`/`"0"`, matching how the store encodes
/// flags. Arrays and objects fall back to their compact JSON text.
pub fn normalize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => normalize_text(s),
        Some(Value::Bool(true)) => "1".to_owned(),
        Some(Value::Bool(false)) => "0".to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string().trim().to_owned(),
    }
}

/// Normalize a plain string: surrounding whitespace removed.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_owned()
}
