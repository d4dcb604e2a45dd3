//! Media element and output context abstractions
//!
//! The controller drives playback through these traits so it can run
//! against a real output device or against in-memory doubles.

use crate::error::Result;
use crate::types::OutputState;
use async_trait::async_trait;
use vibe_core::Track;

/// Something that can play one track at a time
#[async_trait]
pub trait MediaElement: Send {
    /// Point the element at `track`, rewound to 0
    fn load(&mut self, track: &Track) -> Result<()>;

    /// Start or resume playback
    async fn play(&mut self) -> Result<()>;

    /// Pause, keeping the position
    fn pause(&mut self);

    /// Release the current source
    fn unload(&mut self);

    /// Jump to `seconds`
    fn set_current_time(&mut self, seconds: f64);

    /// Position in seconds
    fn current_time(&self) -> f64;

    /// Duration in seconds, once known
    fn duration(&self) -> Option<f64>;
}

/// The audio output the element plays through
#[async_trait]
pub trait OutputContext: Send + Sync {
    /// Current lifecycle state
    fn state(&self) -> OutputState;

    /// Leave the suspended state
    async fn resume(&self) -> Result<()>;
}
