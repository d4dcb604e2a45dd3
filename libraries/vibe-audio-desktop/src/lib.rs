//! Desktop audio output for Vibe Player
//!
//! Provides the CPAL output ([`CpalOutput`]) and the media element that
//! plays tracks through it ([`DesktopElement`]). Together they implement the
//! playback controller's element and output abstractions.
//!
//! # Features
//!
//! - Cross-platform audio output using CPAL
//! - Loading from in-memory uploads, `file://` paths and HTTP(S)
//! - Automatic sample rate conversion
//! - Audio routed through the media source, so the EQ graph and analyser
//!   see every rendered block
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vibe_audio::{AudioEngine, MediaSource};
//! use vibe_audio_desktop::{CpalOutput, DesktopElement};
//! use vibe_playback::PlaybackController;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(MediaSource::new());
//! let (output, _events) = CpalOutput::open(Arc::clone(&source))?;
//!
//! let mut engine = AudioEngine::new(Arc::clone(output.context()), source);
//! let _graph = engine.initialize();
//!
//! let element = DesktopElement::new(&output)?;
//! let _controller = PlaybackController::new(Box::new(element), Arc::new(output));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod element;
mod error;
mod loader;
mod output;
mod resample;

pub use element::DesktopElement;
pub use error::{OutputError, Result};
pub use loader::{MediaLocation, TrackLoader};
pub use output::CpalOutput;
pub use resample::resample;
