//! Core types for playback control

use serde::{Deserialize, Serialize};

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track selected
    #[default]
    Stopped,
    /// Track selected, not playing
    Paused,
    /// Playing audio
    Playing,
}

/// Lifecycle of the audio output, as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Needs `resume` before audio is heard
    Suspended,
    /// Rendering
    Running,
    /// Gone for good
    Closed,
}

/// Notifications from the media element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementEvent {
    /// Playback position advanced (seconds)
    TimeUpdate(f64),
    /// Track metadata is known; carries the duration in seconds
    LoadedMetadata(f64),
    /// The track played to its end
    Ended,
}
