//! Vibe Player Playback
//!
//! Platform-agnostic transport control: the "now playing" pointer, cyclic
//! navigation over the library, and autoplay-aware starts.
//!
//! The controller drives a [`MediaElement`] through an [`OutputContext`];
//! the desktop engine implements both, tests use in-memory doubles.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut controller = PlaybackController::new(Box::new(element), output);
//! controller.set_library(tracks);
//! controller.play_pause().await; // starts the first track
//! controller.next().await;
//! for event in controller.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

mod controller;
mod element;
mod error;
mod events;
mod types;

pub use controller::PlaybackController;
pub use element::{MediaElement, OutputContext};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use types::{ElementEvent, OutputState, PlaybackState};
