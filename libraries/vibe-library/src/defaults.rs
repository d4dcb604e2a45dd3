//! Built-in library used to seed an empty local slot.

use vibe_core::{Track, TrackOrigin};

/// The two hosted tracks every fresh library starts with
pub fn default_library() -> Vec<Track> {
    vec![
        Track::new(
            "Summer Walk",
            "Olexy (Global Hit)",
            "https://cdn.pixabay.com/download/audio/2022/05/27/audio_1808fbf07a.mp3?filename=summer-walk-112694.mp3",
        )
        .with_id("cloud-1")
        .with_origin(TrackOrigin::Remote),
        Track::new(
            "Lofi Chill",
            "FASSounds",
            "https://cdn.pixabay.com/download/audio/2022/02/10/audio_fc8c8375ae.mp3?filename=lofi-study-112191.mp3",
        )
        .with_id("cloud-2")
        .with_origin(TrackOrigin::Remote),
    ]
}
