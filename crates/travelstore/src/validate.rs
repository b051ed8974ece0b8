//! Schema checks for untyped travel entry data.
//!
//! These predicates never fail: they return `false` and log the first
//! offending field at `warn` level so rejected data can be diagnosed.

use serde_json::{Map, Value};
use tracing::warn;

use crate::entry::TravelEntry;

/// Required string fields.
const REQUIRED_STRINGS: &[&str] = &["id", "imageUri", "address"];

/// Required numeric fields.
const REQUIRED_NUMBERS: &[&str] = &["latitude", "longitude", "createdAt"];

/// Optional string fields.
const OPTIONAL_STRINGS: &[&str] = &["title", "notes"];

/// Check whether `value` has the shape of a stored travel entry.
#[must_use]
pub fn is_travel_entry(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        warn!(kind = kind_name(value), "entry rejected: not an object");
        return false;
    };

    for field in REQUIRED_STRINGS {
        if !obj.get(*field).is_some_and(Value::is_string) {
            reject(obj, field, "string");
            return false;
        }
    }

    for field in REQUIRED_NUMBERS {
        if !obj.get(*field).is_some_and(Value::is_number) {
            reject(obj, field, "number");
            return false;
        }
    }

    for field in OPTIONAL_STRINGS {
        if obj.get(*field).is_some_and(|v| !v.is_string()) {
            reject(obj, field, "string");
            return false;
        }
    }

    if let Some(tags) = obj.get("tags") {
        let ok = tags
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !ok {
            reject(obj, "tags", "array of strings");
            return false;
        }
    }

    if obj.get("weather").is_some_and(|v| !v.is_object()) {
        reject(obj, "weather", "object");
        return false;
    }

    true
}

/// Check that `value` is an array whose every element is a travel entry.
///
/// One bad element fails the whole collection.
#[must_use]
pub fn is_travel_entry_collection(value: &Value) -> bool {
    let Some(items) = value.as_array() else {
        warn!(kind = kind_name(value), "collection rejected: not an array");
        return false;
    };

    match items.iter().position(|item| !is_travel_entry(item)) {
        Some(index) => {
            warn!(index, len = items.len(), "collection rejected: invalid entry");
            false
        }
        None => true,
    }
}

/// Check a typed entry by encoding it and running [`is_travel_entry`].
///
/// Non-finite coordinates or timestamps encode as `null` and are rejected
/// here.
#[must_use]
pub fn validate_entry(entry: &TravelEntry) -> bool {
    match serde_json::to_value(entry) {
        Ok(value) => is_travel_entry(&value),
        Err(e) => {
            warn!(id = %entry.id, error = %e, "entry rejected: failed to encode");
            false
        }
    }
}

fn reject(obj: &Map<String, Value>, field: &str, expected: &str) {
    let found = obj.get(field).map_or("missing", kind_name);
    let id = obj.get("id").and_then(Value::as_str).unwrap_or("<unknown>");
    warn!(id, field, expected, found, "entry rejected: invalid field");
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "e1",
            "imageUri": "file:///photo.jpg",
            "address": "Kyoto",
            "latitude": 35.01,
            "longitude": 135.77,
            "createdAt": 1_700_000_000_000_i64
        })
    }

    fn without(field: &str) -> Value {
        let mut value = valid();
        value.as_object_mut().unwrap().remove(field);
        value
    }

    fn with(field: &str, v: Value) -> Value {
        let mut value = valid();
        value.as_object_mut().unwrap().insert(field.to_string(), v);
        value
    }

    #[test]
    fn test_accepts_minimal_entry() {
        assert!(is_travel_entry(&valid()));
    }

    #[test]
    fn test_accepts_all_optionals() {
        let mut value = valid();
        let obj = value.as_object_mut().unwrap();
        obj.insert("title".into(), json!("Temple"));
        obj.insert("notes".into(), json!("Early start"));
        obj.insert("tags".into(), json!(["culture"]));
        obj.insert("weather".into(), json!({"temperature": 12}));
        assert!(is_travel_entry(&value));
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(!is_travel_entry(&json!(null)));
        assert!(!is_travel_entry(&json!("entry")));
        assert!(!is_travel_entry(&json!([valid()])));
    }

    #[test]
    fn test_rejects_each_missing_required_field() {
        for field in REQUIRED_STRINGS.iter().chain(REQUIRED_NUMBERS) {
            assert!(!is_travel_entry(&without(field)), "missing {field} accepted");
        }
    }

    #[test]
    fn test_rejects_wrong_primitive_kinds() {
        assert!(!is_travel_entry(&with("id", json!(7))));
        assert!(!is_travel_entry(&with("address", json!(null))));
        assert!(!is_travel_entry(&with("latitude", json!("35.01"))));
        assert!(!is_travel_entry(&with("createdAt", json!(null))));
    }

    #[test]
    fn test_rejects_mistyped_optionals() {
        assert!(!is_travel_entry(&with("title", json!(1))));
        assert!(!is_travel_entry(&with("notes", json!(null))));
        assert!(!is_travel_entry(&with("tags", json!("a,b"))));
        assert!(!is_travel_entry(&with("tags", json!(["ok", 2]))));
        assert!(!is_travel_entry(&with("weather", json!("sunny"))));
    }

    #[test]
    fn test_weather_members_are_not_checked() {
        assert!(is_travel_entry(&with(
            "weather",
            json!({"temperature": "hot", "conditions": 3})
        )));
    }

    #[test]
    fn test_no_range_validation_on_coordinates() {
        assert!(is_travel_entry(&with("latitude", json!(512.0))));
    }

    #[test]
    fn test_collection_all_valid() {
        assert!(is_travel_entry_collection(&json!([valid(), valid()])));
        assert!(is_travel_entry_collection(&json!([])));
    }

    #[test]
    fn test_collection_fails_on_single_bad_element() {
        let bad = without("latitude");
        assert!(!is_travel_entry_collection(&json!([valid(), bad, valid()])));
    }

    #[test]
    fn test_collection_rejects_non_array() {
        assert!(!is_travel_entry_collection(&valid()));
        assert!(!is_travel_entry_collection(&json!("[]")));
    }

    #[test]
    fn test_validate_entry_rejects_non_finite_numbers() {
        let mut entry = TravelEntry::new("x", "y", 1.0, 2.0);
        assert!(validate_entry(&entry));

        entry.latitude = f64::NAN;
        assert!(!validate_entry(&entry));
    }
}
