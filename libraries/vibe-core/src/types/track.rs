/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Where a track's audio lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackOrigin {
    /// Hosted remotely; the URI outlives the session
    Remote,
    /// Uploaded from this device; the URI is only valid within the session
    #[default]
    LocalDevice,
}

/// Audio track in the library
///
/// Serialized with the same camelCase layout used by the persisted library
/// slot and remote documents (`isCloud` carries the origin flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Playable URI, opaque to everything except the media loader
    pub url: String,

    /// In-memory audio bytes for device-local uploads (never persisted)
    #[serde(skip)]
    pub data: Option<Arc<Vec<u8>>>,

    /// Cached duration in seconds (0 until metadata is loaded)
    #[serde(default)]
    pub duration: f64,

    /// Origin flag
    #[serde(rename = "isCloud", with = "cloud_flag", default)]
    pub origin: TrackOrigin,
}

impl Track {
    /// Create a new device-local track with a fresh identifier
    pub fn new(title: impl Into<String>, artist: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: TrackId::generate(),
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
            data: None,
            duration: 0.0,
            origin: TrackOrigin::LocalDevice,
        }
    }

    /// Replace the identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<TrackId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the origin flag
    #[must_use]
    pub fn with_origin(mut self, origin: TrackOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Attach in-memory audio bytes
    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Set the cached duration in seconds
    #[must_use]
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration = secs;
        self
    }

    /// Whether the track is hosted remotely
    pub fn is_remote(&self) -> bool {
        self.origin == TrackOrigin::Remote
    }

    /// Cached duration, if known
    pub fn duration(&self) -> Option<Duration> {
        if self.duration.is_finite() && self.duration > 0.0 {
            Some(Duration::from_secs_f64(self.duration))
        } else {
            None
        }
    }
}

mod cloud_flag {
    use super::TrackOrigin;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(origin: &TrackOrigin, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*origin == TrackOrigin::Remote)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TrackOrigin, D::Error> {
        let is_cloud = Option::<bool>::deserialize(deserializer)?;
        Ok(match is_cloud {
            Some(true) => TrackOrigin::Remote,
            _ => TrackOrigin::LocalDevice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_track_is_device_local() {
        let track = Track::new("Demo", "Local Artist", "file:///tmp/demo.mp3");
        assert_eq!(track.origin, TrackOrigin::LocalDevice);
        assert!(track.duration().is_none());
        assert!(!track.id.as_str().is_empty());
    }

    #[test]
    fn deserializes_persisted_layout() {
        let json = r#"{
            "id": "cloud-1",
            "title": "Summer Walk",
            "artist": "Olexy (Global Hit)",
            "url": "https://cdn.example.com/summer.mp3",
            "duration": 0,
            "isCloud": true
        }"#;

        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.id.as_str(), "cloud-1");
        assert!(track.is_remote());
        assert!(track.data.is_none());
    }

    #[test]
    fn missing_origin_flag_means_local_device() {
        let json = r#"{"id":"x","title":"t","artist":"a","url":"blob:1"}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.origin, TrackOrigin::LocalDevice);
        assert_eq!(track.duration, 0.0);
    }

    #[test]
    fn data_handle_is_never_serialized() {
        let track = Track::new("Demo", "Local Artist", "file:///tmp/demo.mp3").with_data(vec![1, 2, 3]);
        let json = serde_json::to_value(&track).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["isCloud"], serde_json::Value::Bool(false));
    }
}
