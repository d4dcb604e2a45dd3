/// Serial processing chain
///
/// The filter graph runs its band filters and the analyser tap through an
/// `EffectChain`. Every stage operates on interleaved stereo f32 samples.

/// A stage in the filter graph
///
/// # Safety
/// - Must NOT allocate memory in `process()` (real-time constraint)
/// - Must be Send so the graph can move onto the audio thread
pub trait AudioEffect: Send {
    /// Process audio buffer in-place
    ///
    /// # Arguments
    /// * `buffer` - Interleaved stereo samples (L, R, L, R, ...)
    /// * `sample_rate` - Sample rate in Hz
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32);

    /// Reset filter state (e.g. when a new track is loaded)
    fn reset(&mut self);

    /// Enable/disable the stage
    fn set_enabled(&mut self, enabled: bool);

    /// Check if the stage is enabled
    fn is_enabled(&self) -> bool;

    /// Stage name (for debugging)
    fn name(&self) -> &str;
}

/// Chain of stages processed in order
pub struct EffectChain {
    effects: Vec<Box<dyn AudioEffect>>,
}

impl EffectChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Append a stage to the end of the chain
    pub fn add_effect(&mut self, effect: Box<dyn AudioEffect>) {
        self.effects.push(effect);
    }

    /// Run the buffer through every enabled stage, in insertion order
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        for effect in &mut self.effects {
            if effect.is_enabled() {
                effect.process(buffer, sample_rate);
            }
        }
    }

    /// Reset all stages
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Stage names in processing order
    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.name()).collect()
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}
