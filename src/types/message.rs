//! Streamed message and coordinate types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A geographic position as a (latitude, longitude) pair.
///
/// Both values are always present: there is no way to build a half-filled pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a pair from two independently nullable values.
    ///
    /// Returns `None` unless both are set.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self::new(latitude, longitude)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// One unit of streamed content flowing through the enrichment pipeline.
///
/// Only `from_user` and `coordinates` matter to geo-fixing. Every other field,
/// including wire fields this crate does not know about, is carried through
/// untouched so downstream stages see the message exactly as upstream sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord", into = "MessageRecord")]
pub struct Message {
    pub id: Option<String>,
    pub text: Option<String>,
    /// Author identifier, the key used to find the author's profile
    pub from_user: Option<String>,
    pub source: Option<String>,
    pub language: Option<String>,
    pub date: Option<DateTime<Utc>>,
    coordinates: Option<Coordinates>,
    /// Wire fields not modelled above, preserved verbatim
    pub extra: Map<String, Value>,
}

impl Message {
    /// Create a message with only an author set.
    pub fn from_author(from_user: impl Into<String>) -> Self {
        Self {
            id: None,
            text: None,
            from_user: Some(from_user.into()),
            source: None,
            language: None,
            date: None,
            coordinates: None,
            extra: Map::new(),
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub const fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub const fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }

    /// Attach coordinates, setting latitude and longitude together.
    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
    }

    /// Author identifier exactly as received.
    ///
    /// Returns `None` for a missing author or one made only of whitespace,
    /// which callers treat as "nothing to resolve against". A non-blank
    /// author is never trimmed: profile lookups match usernames exactly.
    pub fn author(&self) -> Option<&str> {
        self.from_user
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

// ============================================================================
// Wire representation
// ============================================================================

/// JSON shape of a message, with latitude and longitude as separate fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = String;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let coordinates = match (record.latitude, record.longitude) {
            (None, None) => None,
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            (Some(_), None) => return Err("message has latitude without longitude".to_string()),
            (None, Some(_)) => return Err("message has longitude without latitude".to_string()),
        };

        Ok(Self {
            id: record.id,
            text: record.text,
            from_user: record.from_user,
            source: record.source,
            language: record.language,
            date: record.date,
            coordinates,
            extra: record.extra,
        })
    }
}

impl From<Message> for MessageRecord {
    fn from(mut message: Message) -> Self {
        // Coordinates only ever come from the typed pair
        message.extra.remove("latitude");
        message.extra.remove("longitude");

        Self {
            id: message.id,
            text: message.text,
            from_user: message.from_user,
            source: message.source,
            language: message.language,
            date: message.date,
            latitude: message.coordinates.map(|c| c.latitude),
            longitude: message.coordinates.map(|c| c.longitude),
            extra: message.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_from_parts_requires_both() {
        assert_eq!(
            Coordinates::from_parts(Some(1.0), Some(2.0)),
            Some(Coordinates::new(1.0, 2.0))
        );
        assert!(Coordinates::from_parts(Some(1.0), None).is_none());
        assert!(Coordinates::from_parts(None, Some(2.0)).is_none());
        assert!(Coordinates::from_parts(None, None).is_none());
    }

    #[test]
    fn test_author_kept_verbatim_unless_blank() {
        assert_eq!(Message::from_author("  alice ").author(), Some("  alice "));
        assert!(Message::from_author("   ").author().is_none());

        let mut message = Message::from_author("x");
        message.from_user = None;
        assert!(message.author().is_none());
    }

    #[test]
    fn test_decode_with_coordinates_and_unknown_fields() {
        let json = r#"{
            "id": "m1",
            "fromUser": "alice",
            "latitude": 40.7,
            "longitude": -74.0,
            "customTags": ["a", "b"]
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();

        assert_eq!(message.author(), Some("alice"));
        assert_eq!(message.coordinates(), Some(Coordinates::new(40.7, -74.0)));
        assert_eq!(message.extra["customTags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_decode_rejects_half_pair() {
        let json = r#"{"fromUser": "carol", "latitude": 10.0}"#;
        let err = serde_json::from_str::<Message>(json).unwrap_err();
        assert!(err.to_string().contains("latitude without longitude"));
    }

    #[test]
    fn test_encode_keeps_unknown_fields_and_omits_missing_coordinates() {
        let json = r#"{"fromUser":"bob","parent":"p9"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["fromUser"], "bob");
        assert_eq!(value["parent"], "p9");
        assert!(value.get("latitude").is_none());
        assert!(value.get("longitude").is_none());
    }

    #[test]
    fn test_encode_ignores_coordinate_keys_in_extra() {
        let mut message = Message::from_author("bob");
        message.extra.insert("latitude".to_string(), serde_json::json!(9.0));

        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("latitude").is_none());
        assert!(value.get("longitude").is_none());

        message.set_coordinates(Coordinates::new(1.0, 2.0));
        message.extra.insert("longitude".to_string(), serde_json::json!(8.0));
        let text = serde_json::to_string(&message).unwrap();
        assert_eq!(text.matches("\"latitude\"").count(), 1);
        assert_eq!(text.matches("\"longitude\"").count(), 1);

        let back: Message = serde_json::from_str(&text).unwrap();
        assert_eq!(back.coordinates(), Some(Coordinates::new(1.0, 2.0)));
    }
}
