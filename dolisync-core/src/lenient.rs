//! Forgiving deserializers for loosely typed JSON.
//!
//! Import files are hand-edited and Dolibarr is a PHP service, so the same
//! logical value shows up as `"4"`, `4`, `true`, `null` or `[]` depending on
//! who wrote it.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Text field: strings as-is, numbers and booleans in their string form,
/// `null` as absent.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string, number or boolean, found {other}"
        ))),
    }
}

/// Boolean flag: `true`/`false`, non-zero numbers, or a truthy string.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Some(Value::String(s)) => Ok(parse_flag(&s)),
        Some(other) => Err(de::Error::custom(format!(
            "expected a boolean flag, found {other}"
        ))),
    }
}

/// `"1"`, `"true"`, `"yes"` and `"on"` (any case, surrounding blanks ignored)
/// are true; everything else is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Identifier sent either as a JSON string or a JSON integer.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_owned())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected an identifier, found {other}"
        ))),
    }
}

/// Extra-attribute bundle. PHP encodes an empty associative array as `[]`,
/// so an empty list and `null` both mean "no attributes".
pub(crate) fn attribute_bundle<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Array(items)) if items.is_empty() => Ok(Map::new()),
        Some(other) => Err(de::Error::custom(format!(
            "expected an attribute object, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", true)]
    #[case(" TRUE ", true)]
    #[case("yes", true)]
    #[case("On", true)]
    #[case("0", false)]
    #[case("false", false)]
    #[case("", false)]
    #[case("maybe", false)]
    fn flag_strings(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_flag(raw), expected);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "attribute_bundle")]
        bundle: Map<String, Value>,
        #[serde(default, deserialize_with = "id_string")]
        id: Option<String>,
    }

    #[test]
    fn php_empty_array_is_empty_bundle() {
        let probe: Probe = serde_json::from_str(r#"{"bundle": [], "id": 7}"#).unwrap();
        assert!(probe.bundle.is_empty());
        assert_eq!(probe.id.as_deref(), Some("7"));
    }

    #[test]
    fn non_empty_list_bundle_is_rejected() {
        let result = serde_json::from_str::<Probe>(r#"{"bundle": ["x"]}"#);
        assert!(result.is_err());
    }
}
