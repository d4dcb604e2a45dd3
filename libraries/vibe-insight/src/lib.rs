//! Vibe Player Insight
//!
//! Cosmetic playlist analysis: a hosted text model names the playlist,
//! describes its mood and suggests a two-color gradient for theming.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vibe_insight::{GeminiClient, ModelConfig, VibeAnalyzer};
//!
//! let client = GeminiClient::new(ModelConfig {
//!     api_key: Some(key),
//!     ..ModelConfig::default()
//! })?;
//! let analyzer = VibeAnalyzer::new(Arc::new(client));
//! let report = analyzer.analyze(&titles).await;
//! println!("{}: {}", report.playlist_name, report.description);
//! ```

mod analyzer;
mod error;
mod model;

pub use analyzer::{mixed, silence, VibeAnalyzer};
pub use error::{InsightError, Result};
pub use model::{GeminiClient, ModelConfig, TextModel, DEFAULT_BASE_URL, DEFAULT_MODEL};
