//! Audio context and media source
//!
//! The context owns the render clock shared by every node of the graph. The
//! media source is the single input that feeds the filter graph; it accepts
//! exactly one processor for its whole lifetime.

use crate::error::{AudioError, Result};
use crate::graph::GraphProcessor;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Frames processed per automation step
pub const RENDER_QUANTUM: usize = 128;

/// Lifecycle of an audio context
///
/// Contexts start suspended and must be resumed from a user gesture (the
/// first play request) before any audio is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Not rendering; `resume` required
    Suspended,
    /// Rendering
    Running,
    /// Shut down for good
    Closed,
}

impl ContextState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Closed,
            _ => Self::Suspended,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Suspended => 0,
            Self::Running => 1,
            Self::Closed => 2,
        }
    }
}

/// Render clock and state for one output device session
#[derive(Debug)]
pub struct AudioContext {
    sample_rate: u32,
    frames: AtomicU64,
    state: AtomicU8,
}

impl AudioContext {
    /// Create a suspended context rendering at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames: AtomicU64::new(0),
            state: AtomicU8::new(ContextState::Suspended.as_u8()),
        }
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far
    pub fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / f64::from(self.sample_rate)
    }

    /// Advance the render clock after a block has been produced
    pub fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::AcqRel);
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to a new lifecycle state
    ///
    /// A closed context stays closed.
    pub fn set_state(&self, state: ContextState) -> Result<()> {
        if self.state() == ContextState::Closed && state != ContextState::Closed {
            return Err(AudioError::ContextClosed);
        }
        self.state.store(state.as_u8(), Ordering::Release);
        Ok(())
    }
}

/// The audio element's output, wired into at most one graph
pub struct MediaSource {
    processor: Mutex<Option<GraphProcessor>>,
}

impl MediaSource {
    /// Create an unwired source
    pub fn new() -> Self {
        Self {
            processor: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<GraphProcessor>> {
        self.processor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a graph already consumes this source
    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Install the processing half of a graph
    ///
    /// # Errors
    /// `AudioError::SourceAlreadyConnected` if a graph is already installed.
    pub fn connect(&self, processor: GraphProcessor) -> Result<()> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(AudioError::SourceAlreadyConnected);
        }
        *slot = Some(processor);
        Ok(())
    }

    /// Run a block of interleaved stereo audio through the installed graph
    ///
    /// Without a graph the audio passes through unchanged.
    pub fn process(&self, buffer: &mut [f32], sample_rate: u32) {
        if let Some(processor) = self.lock().as_mut() {
            processor.process(buffer, sample_rate);
        }
    }

    /// Clear filter state, e.g. when a new track starts
    pub fn reset(&self) {
        if let Some(processor) = self.lock().as_mut() {
            processor.reset();
        }
    }
}

impl Default for MediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSource")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_starts_suspended() {
        let ctx = AudioContext::new(48000);
        assert_eq!(ctx.state(), ContextState::Suspended);
        assert_eq!(ctx.current_time(), 0.0);
    }

    #[test]
    fn clock_advances_with_rendered_frames() {
        let ctx = AudioContext::new(48000);
        ctx.advance(24000);
        assert!((ctx.current_time() - 0.5).abs() < 1e-9);
        ctx.advance(24000);
        assert!((ctx.current_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn closed_context_cannot_resume() {
        let ctx = AudioContext::new(44100);
        ctx.set_state(ContextState::Running).unwrap();
        ctx.set_state(ContextState::Closed).unwrap();
        assert!(matches!(
            ctx.set_state(ContextState::Running),
            Err(AudioError::ContextClosed)
        ));
    }

    #[test]
    fn unwired_source_passes_audio_through() {
        let source = MediaSource::new();
        let mut buffer = vec![0.25, -0.25, 0.5, -0.5];
        source.process(&mut buffer, 44100);
        assert_eq!(buffer, vec![0.25, -0.25, 0.5, -0.5]);
        assert!(!source.is_connected());
    }
}
