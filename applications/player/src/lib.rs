//! Vibe Player
//!
//! Command-line music player: library management over a remote collection
//! with a local fallback, a five-band EQ, a terminal spectrum visualizer
//! and playlist vibe reports.
//!
//! This library exposes the application pieces for testing purposes.

pub mod canvas;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;
pub mod upload;

// Re-export commonly used types for convenience
pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use session::AdminSession;
