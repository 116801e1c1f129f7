//! Utility functions shared across the application.
//!
//! API Gateway writes `null` instead of omitting absent maps, lists and
//! strings, so the wire models route those fields through
//! [`null_as_default`].

use serde::{Deserialize, Deserializer};

/// Deserializes a field that may be `null`, falling back to `T::default()`.
///
/// # Errors
///
/// Returns the deserializer's error when the value is present but does not
/// match `T`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Probe {
        #[serde(deserialize_with = "null_as_default")]
        map: HashMap<String, String>,
        #[serde(deserialize_with = "null_as_default")]
        text: String,
    }

    #[test]
    fn test_null_becomes_default() {
        let probe: Probe = serde_json::from_value(json!({"map": null, "text": null})).unwrap();
        assert!(probe.map.is_empty());
        assert_eq!(probe.text, "");
    }

    #[test]
    fn test_missing_becomes_default() {
        let probe: Probe = serde_json::from_value(json!({})).unwrap();
        assert!(probe.map.is_empty());
    }

    #[test]
    fn test_present_value_is_kept() {
        let probe: Probe =
            serde_json::from_value(json!({"map": {"a": "1"}, "text": "hi"})).unwrap();
        assert_eq!(probe.map.get("a").map(String::as_str), Some("1"));
        assert_eq!(probe.text, "hi");
    }
}
