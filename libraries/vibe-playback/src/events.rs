//! Playback Events
//!
//! Queued by the controller at every transport change and drained by the
//! UI loop.

use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Transport state changed
    StateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new track, `None` when playback was cleared
        track_id: Option<String>,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Position or duration changed
    PositionUpdate {
        /// Elapsed seconds
        elapsed: f64,
        /// Duration in seconds (0 until known)
        duration: f64,
    },

    /// Track played to its end
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// A play attempt failed
    Error {
        /// Error message
        message: String,
    },
}
