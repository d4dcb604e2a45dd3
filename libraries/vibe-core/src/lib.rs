//! Vibe Player Core
//!
//! Platform-agnostic core types and error handling for Vibe Player.
//!
//! This crate provides the foundational building blocks shared by the audio
//! graph, the library store, the playback controller and the vibe analyzer.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `TrackOrigin`, `VibeAnalysis`
//! - **Audio Types**: `AudioBuffer`, `AudioFormat`, `SampleRate`
//! - **Error Handling**: Unified `VibeError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use vibe_core::types::{Track, TrackOrigin};
//!
//! let track = Track::new("Summer Walk", "Olexy", "https://cdn.example.com/summer.mp3")
//!     .with_origin(TrackOrigin::Remote);
//!
//! assert!(track.is_remote());
//! assert_eq!(track.duration, 0.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Result, VibeError};

pub use types::{
    // Audio types
    AudioBuffer, AudioFormat, SampleRate,
    // Library types
    Track, TrackId, TrackOrigin,
    // Derived analysis
    VibeAnalysis,
};
