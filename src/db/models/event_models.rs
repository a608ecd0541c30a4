use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Camera id recorded when the producer does not name one
pub const DEFAULT_CAMERA_ID: &str = "default";

/// Event model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub description: String,
    pub camera_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Raw `events` row; `timestamp` is epoch milliseconds
#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub event_type: String,
    pub description: Option<String>,
    pub camera_id: Option<String>,
    pub timestamp: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = Error;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(row.timestamp).ok_or_else(|| {
            Error::Storage(format!(
                "Event {} has an out of range timestamp: {}",
                row.id, row.timestamp
            ))
        })?;

        Ok(Self {
            id: row.id,
            event_type: row.event_type,
            description: row.description.unwrap_or_default(),
            camera_id: row
                .camera_id
                .unwrap_or_else(|| DEFAULT_CAMERA_ID.to_string()),
            timestamp,
        })
    }
}

/// Event as submitted by a producer, before the store assigns identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub camera_id: Option<String>,
}

/// A `NewEvent` that passed validation, with optional fields resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEvent {
    pub event_type: String,
    pub description: String,
    pub camera_id: String,
}

impl NewEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_camera(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }

    /// Check required fields and fill in defaults
    pub fn validate(&self) -> Result<ValidEvent, Error> {
        let event_type = match self.event_type.as_deref() {
            Some(event_type) if !event_type.trim().is_empty() => event_type.to_string(),
            _ => return Err(Error::Validation("event_type is required".to_string())),
        };

        let camera_id = match self.camera_id.as_deref() {
            Some(camera_id) if !camera_id.is_empty() => camera_id.to_string(),
            _ => DEFAULT_CAMERA_ID.to_string(),
        };

        Ok(ValidEvent {
            event_type,
            description: self.description.clone().unwrap_or_default(),
            camera_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_event_type_is_rejected() {
        for event in [NewEvent::default(), NewEvent::new(""), NewEvent::new("   ")] {
            let err = event.validate().unwrap_err();
            assert_eq!(err, Error::Validation("event_type is required".to_string()));
        }
    }

    #[test]
    fn optional_fields_get_defaults() {
        let valid = NewEvent::new("Person Detected").validate().unwrap();
        assert_eq!(valid.description, "");
        assert_eq!(valid.camera_id, DEFAULT_CAMERA_ID);

        let valid = NewEvent::new("Person Detected")
            .with_camera("CAM-01")
            .with_description("hallway")
            .validate()
            .unwrap();
        assert_eq!(valid.camera_id, "CAM-01");
        assert_eq!(valid.description, "hallway");
    }

    #[test]
    fn null_columns_map_to_defaults() {
        let event = Event::try_from(EventRow {
            id: 3,
            event_type: "Rock_FIST".to_string(),
            description: None,
            camera_id: None,
            timestamp: 1_768_810_365_000,
        })
        .unwrap();

        assert_eq!(event.description, "");
        assert_eq!(event.camera_id, DEFAULT_CAMERA_ID);
        assert_eq!(event.timestamp.timestamp_millis(), 1_768_810_365_000);
    }
}
