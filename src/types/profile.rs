//! Author profile types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// A known author, as persisted by the profile store.
///
/// Latitude and longitude are stored independently and may each be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique lookup key, matched exactly against a message's author
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-text location as entered by the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followings: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Profile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            source: None,
            location: None,
            language: None,
            followers: None,
            followings: None,
            activation_date: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_position(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// Stored position, only when both latitude and longitude are known.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}
