//! Travel entry records.
//!
//! A [`TravelEntry`] is the only persisted entity. Its JSON shape uses
//! camelCase field names (`imageUri`, `createdAt`) so stored collections stay
//! readable by other clients of the same key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::validate;

/// Number of random characters appended to generated ids.
const ID_RANDOM_LEN: usize = 9;

/// One travel diary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelEntry {
    /// Unique identifier within the stored collection.
    pub id: String,

    /// Opaque reference to the associated photo or media.
    pub image_uri: String,

    /// Human-readable location label.
    pub address: String,

    /// Latitude of the location.
    pub latitude: f64,

    /// Longitude of the location.
    pub longitude: f64,

    /// Creation timestamp. Entries are read back newest first by this value.
    pub created_at: f64,

    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Optional tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    /// Optional weather snapshot taken when the entry was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
}

impl TravelEntry {
    /// Create a new entry with a generated id, stamped with the current time
    /// in epoch milliseconds.
    #[must_use]
    pub fn new(
        image_uri: impl Into<String>,
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: generate_entry_id(),
            image_uri: image_uri.into(),
            address: address.into(),
            latitude,
            longitude,
            created_at: now_millis(),
            title: None,
            notes: None,
            tags: None,
            weather: None,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Set the weather snapshot.
    #[must_use]
    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Narrow an untyped value into an entry.
    ///
    /// Returns `None` if the value fails [`validate::is_travel_entry`].
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        if !validate::is_travel_entry(&value) {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// The creation time as a UTC datetime, if `created_at` holds epoch
    /// milliseconds in the representable range.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.created_at.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis(self.created_at as i64)
    }

    /// Check whether this entry carries `tag`, ignoring ASCII case.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .is_some_and(|tags| tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
    }
}

/// Weather conditions attached to an entry.
///
/// Stored as an open JSON object: only its shape (an object) is checked, so
/// members are read through accessors that tolerate missing or mistyped
/// values, and unknown members survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weather(Map<String, Value>);

impl Weather {
    /// Build a weather snapshot from its conventional members.
    #[must_use]
    pub fn new(temperature: Option<f64>, humidity: Option<f64>, conditions: Option<&str>) -> Self {
        let mut map = Map::new();
        if let Some(t) = temperature {
            map.insert("temperature".to_string(), Value::from(t));
        }
        if let Some(h) = humidity {
            map.insert("humidity".to_string(), Value::from(h));
        }
        if let Some(c) = conditions {
            map.insert("conditions".to_string(), Value::from(c));
        }
        Self(map)
    }

    /// Temperature, if present and numeric.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.0.get("temperature").and_then(Value::as_f64)
    }

    /// Relative humidity, if present and numeric.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.0.get("humidity").and_then(Value::as_f64)
    }

    /// Conditions label, if present and a string.
    #[must_use]
    pub fn conditions(&self) -> Option<&str> {
        self.0.get("conditions").and_then(Value::as_str)
    }

    /// The raw members.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Weather {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Generate a fresh entry id from the current time plus randomness.
///
/// The format is `<epoch-millis>-<9 hex chars>`.
#[must_use]
pub fn generate_entry_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        &random[..ID_RANDOM_LEN]
    )
}

#[allow(clippy::cast_precision_loss)]
fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}
