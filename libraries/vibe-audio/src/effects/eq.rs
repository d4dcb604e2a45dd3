/// Equalizer band filters
///
/// Each band is one biquad section per channel whose gain is driven by a
/// shared `AudioParam`. Coefficients are recomputed at render-quantum
/// granularity, and only when the evaluated gain actually moved.
use super::chain::AudioEffect;
use crate::context::{AudioContext, RENDER_QUANTUM};
use crate::error::{AudioError, Result};
use crate::param::AudioParam;
use biquad::{Biquad, Coefficients, DirectForm2Transposed, Hertz, Type, Q_BUTTERWORTH_F32};
use std::sync::Arc;

/// Smallest gain change (dB) that triggers a coefficient update
const GAIN_EPSILON: f32 = 1e-3;

/// Filter shape for an EQ band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    /// Boosts/cuts below the corner frequency
    LowShelf,
    /// Boosts/cuts around the centre frequency
    Peaking,
    /// Boosts/cuts above the corner frequency
    HighShelf,
}

impl FilterShape {
    /// Shape used for band `index` of a `count`-band equalizer
    ///
    /// The first band is a low shelf, the last a high shelf, everything in
    /// between peaking.
    pub fn for_position(index: usize, count: usize) -> Self {
        if index == 0 {
            Self::LowShelf
        } else if index + 1 == count {
            Self::HighShelf
        } else {
            Self::Peaking
        }
    }

    fn default_q(self) -> f32 {
        match self {
            Self::LowShelf | Self::HighShelf => Q_BUTTERWORTH_F32,
            Self::Peaking => 1.0,
        }
    }
}

/// Static configuration of one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSpec {
    /// Centre/corner frequency in Hz
    pub frequency: f32,
    /// Filter shape
    pub shape: FilterShape,
    /// Quality factor
    pub q: f32,
}

impl BandSpec {
    /// Band at `frequency` with the shape's default Q
    pub fn new(frequency: f32, shape: FilterShape) -> Self {
        Self {
            frequency,
            shape,
            q: shape.default_q(),
        }
    }

    /// Biquad coefficients for this band at `gain_db` and `sample_rate`
    pub fn coefficients(&self, gain_db: f32, sample_rate: u32) -> Result<Coefficients<f32>> {
        let fs = sample_rate as f32;
        // Keep the corner below Nyquist for low output rates
        let f0 = self.frequency.min(fs * 0.45);

        let filter = match self.shape {
            FilterShape::LowShelf => Type::LowShelf(gain_db),
            FilterShape::Peaking => Type::PeakingEQ(gain_db),
            FilterShape::HighShelf => Type::HighShelf(gain_db),
        };

        let fs = Hertz::<f32>::from_hz(fs).map_err(|e| AudioError::Filter(format!("{:?}", e)))?;
        let f0 = Hertz::<f32>::from_hz(f0).map_err(|e| AudioError::Filter(format!("{:?}", e)))?;

        Coefficients::<f32>::from_params(filter, fs, f0, self.q)
            .map_err(|e| AudioError::Filter(format!("{:?}", e)))
    }
}

/// Processing half of one EQ band
pub struct BandFilter {
    spec: BandSpec,
    gain: Arc<AudioParam>,
    context: Arc<AudioContext>,
    left: DirectForm2Transposed<f32>,
    right: DirectForm2Transposed<f32>,
    applied_gain: f32,
    sample_rate: u32,
    enabled: bool,
    name: String,
}

impl BandFilter {
    /// Create a filter for `spec`, reading its gain from `gain`
    ///
    /// Fails if the band cannot be realised at the context's sample rate.
    pub fn new(spec: BandSpec, gain: Arc<AudioParam>, context: Arc<AudioContext>) -> Result<Self> {
        let sample_rate = context.sample_rate();
        let applied_gain = gain.value();
        let coeffs = spec.coefficients(applied_gain, sample_rate)?;

        Ok(Self {
            spec,
            gain,
            context,
            left: DirectForm2Transposed::<f32>::new(coeffs),
            right: DirectForm2Transposed::<f32>::new(coeffs),
            applied_gain,
            sample_rate,
            enabled: true,
            name: format!("EQ {} Hz", spec.frequency),
        })
    }

    /// Band configuration
    pub fn spec(&self) -> &BandSpec {
        &self.spec
    }

    fn retune(&mut self, gain_db: f32, sample_rate: u32) {
        // An unrealisable setting keeps the previous response
        if let Ok(coeffs) = self.spec.coefficients(gain_db, sample_rate) {
            self.left.update_coefficients(coeffs);
            self.right.update_coefficients(coeffs);
            self.applied_gain = gain_db;
            self.sample_rate = sample_rate;
        }
    }
}

impl AudioEffect for BandFilter {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if sample_rate != self.sample_rate {
            self.retune(self.applied_gain, sample_rate);
        }

        let start = self.context.current_time();
        let rate = f64::from(sample_rate);

        for (block_index, block) in buffer.chunks_mut(RENDER_QUANTUM * 2).enumerate() {
            let time = start + (block_index * RENDER_QUANTUM) as f64 / rate;
            let gain = self.gain.value_at(time);
            if (gain - self.applied_gain).abs() > GAIN_EPSILON {
                self.retune(gain, sample_rate);
            }

            for frame in block.chunks_exact_mut(2) {
                frame[0] = self.left.run(frame[0]);
                frame[1] = self.right.run(frame[1]);
            }
        }
    }

    fn reset(&mut self) {
        if let Ok(coeffs) = self.spec.coefficients(self.applied_gain, self.sample_rate) {
            self.left = DirectForm2Transposed::<f32>::new(coeffs);
            self.right = DirectForm2Transposed::<f32>::new(coeffs);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        &self.name
    }
}
