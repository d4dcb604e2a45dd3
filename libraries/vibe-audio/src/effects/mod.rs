//! Filter-graph stages
//!
//! Every stage implements [`AudioEffect`] and operates on interleaved stereo
//! f32 samples. The graph strings five [`BandFilter`]s together, followed by
//! the analyser tap.

mod chain;
mod eq;

pub use chain::{AudioEffect, EffectChain};
pub use eq::{BandFilter, BandSpec, FilterShape};
