//! Vibe Player Audio
//!
//! Signal chain, equalizer and spectrum analysis for Vibe Player.
//!
//! This crate provides:
//! - An audio context with a render clock and a single-owner media source
//! - A five-band equalizer graph (low shelf, three peaking bands, high shelf)
//!   with smoothly automated gains
//! - Named equalizer presets
//! - A spectrum analyser and a cancellable visualizer loop
//! - Full-file decoding via Symphonia
//!
//! # Example: Building the graph and applying a preset
//!
//! ```rust
//! use std::sync::Arc;
//! use vibe_audio::{AudioContext, AudioEngine, MediaSource, PresetEngine};
//!
//! let context = Arc::new(AudioContext::new(48000));
//! let source = Arc::new(MediaSource::new());
//!
//! let mut engine = AudioEngine::new(context, Arc::clone(&source));
//! let graph = engine.initialize();
//!
//! let mut presets = PresetEngine::new(graph);
//! assert_eq!(presets.apply_preset("Bass"), [8.0, 5.0, 1.0, 0.0, 0.0]);
//!
//! // The audio thread pushes blocks through the source
//! let mut block = vec![0.0f32; 256];
//! source.process(&mut block, 48000);
//! ```

pub mod analyser;
pub mod context;
mod decoder;
pub mod effects;
mod error;
pub mod graph;
pub mod param;
pub mod preset;
pub mod visualizer;

pub use analyser::{AnalyserConfig, SpectrumAnalyser};
pub use context::{AudioContext, ContextState, MediaSource, RENDER_QUANTUM};
pub use decoder::SymphoniaDecoder;
pub use error::{AudioError, Result};
pub use graph::{AudioEngine, EqBand, FilterGraph, GraphProcessor, BAND_COUNT, EQ_FREQUENCIES};
pub use param::AudioParam;
pub use preset::{EqPreset, PresetEngine};
pub use visualizer::{Canvas, Gradient, Rect, Rgba, VisualizerLoop};
