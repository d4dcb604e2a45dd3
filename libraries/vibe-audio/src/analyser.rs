//! Spectrum analyser
//!
//! A tap at the end of the filter graph keeps the most recent `fft_size`
//! mono samples. On demand, the analyser windows them (Blackman), runs a
//! forward FFT, smooths magnitudes over time and maps them onto 0..=255
//! between `min_decibels` and `max_decibels`.

use crate::effects::AudioEffect;
use crate::error::{AudioError, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Analyser settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserConfig {
    /// FFT window length; a power of two
    pub fft_size: usize,
    /// Weight of the previous frame when smoothing, in [0, 1)
    pub smoothing_time_constant: f32,
    /// Level mapped to 0
    pub min_decibels: f32,
    /// Level mapped to 255
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    fn validate(&self) -> Result<()> {
        if !(32..=32768).contains(&self.fft_size) || !self.fft_size.is_power_of_two() {
            return Err(AudioError::InvalidAnalyser(format!(
                "fft_size must be a power of two in 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(AudioError::InvalidAnalyser(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(AudioError::InvalidAnalyser(
                "min_decibels must be below max_decibels".to_string(),
            ));
        }
        Ok(())
    }
}

struct TimeDomain {
    samples: Vec<f32>,
    write_pos: usize,
}

struct Spectrum {
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

/// Shared spectrum analyser
pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Mutex<TimeDomain>,
    spectrum: Mutex<Spectrum>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Blackman window coefficient, as used by browser analysers
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

impl SpectrumAnalyser {
    /// Create an analyser
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        config.validate()?;

        let size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Ok(Self {
            config,
            fft,
            window,
            time_domain: Mutex::new(TimeDomain {
                samples: vec![0.0; size],
                write_pos: 0,
            }),
            spectrum: Mutex::new(Spectrum {
                smoothed: vec![0.0; size / 2],
                scratch: vec![Complex::new(0.0, 0.0); size],
            }),
        })
    }

    /// Analyser settings
    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Number of frequency bins (`fft_size / 2`)
    pub fn frequency_bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Feed interleaved stereo audio; channels are averaged to mono
    pub fn push_stereo(&self, buffer: &[f32]) {
        let mut td = relock(&self.time_domain);
        let size = td.samples.len();
        for frame in buffer.chunks_exact(2) {
            let pos = td.write_pos;
            td.samples[pos] = (frame[0] + frame[1]) * 0.5;
            td.write_pos = (pos + 1) % size;
        }
    }

    /// Current spectrum as bytes, one per bin
    pub fn byte_frequency_data(&self) -> Vec<u8> {
        let mut out = vec![0; self.frequency_bin_count()];
        self.get_byte_frequency_data(&mut out);
        out
    }

    /// Fill `out` with the current spectrum, one byte per bin
    ///
    /// Writes at most `frequency_bin_count()` bytes. Each call advances the
    /// temporal smoothing by one step.
    pub fn get_byte_frequency_data(&self, out: &mut [u8]) {
        let size = self.config.fft_size;
        let mut spectrum = relock(&self.spectrum);
        let Spectrum { smoothed, scratch } = &mut *spectrum;

        {
            let td = relock(&self.time_domain);
            for (i, slot) in scratch.iter_mut().enumerate() {
                let sample = td.samples[(td.write_pos + i) % size];
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
        }

        self.fft.process(scratch);

        let tau = self.config.smoothing_time_constant;
        let range = self.config.max_decibels - self.config.min_decibels;
        let scale = 1.0 / size as f32;

        for (k, (value, byte)) in smoothed.iter_mut().zip(out.iter_mut()).enumerate() {
            let magnitude = scratch[k].norm() * scale;
            *value = tau * *value + (1.0 - tau) * magnitude;

            let db = if *value > 0.0 {
                20.0 * value.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 / range * (db - self.config.min_decibels);
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

impl std::fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Graph stage feeding the analyser; leaves audio untouched
pub struct AnalyserTap {
    analyser: Arc<SpectrumAnalyser>,
    enabled: bool,
}

impl AnalyserTap {
    /// Tap feeding `analyser`
    pub fn new(analyser: Arc<SpectrumAnalyser>) -> Self {
        Self {
            analyser,
            enabled: true,
        }
    }
}

impl AudioEffect for AnalyserTap {
    fn process(&mut self, buffer: &mut [f32], _sample_rate: u32) {
        self.analyser.push_stereo(buffer);
    }

    fn reset(&mut self) {}

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Analyser"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::tests::generate_sine;

    #[test]
    fn default_config_gives_256_bins() {
        let analyser = SpectrumAnalyser::new(AnalyserConfig::default()).unwrap();
        assert_eq!(analyser.frequency_bin_count(), 256);
        assert_eq!(analyser.byte_frequency_data().len(), 256);
    }

    #[test]
    fn rejects_bad_fft_size() {
        let config = AnalyserConfig {
            fft_size: 500,
            ..AnalyserConfig::default()
        };
        assert!(matches!(
            SpectrumAnalyser::new(config),
            Err(AudioError::InvalidAnalyser(_))
        ));
    }

    #[test]
    fn silence_reads_as_zero() {
        let analyser = SpectrumAnalyser::new(AnalyserConfig::default()).unwrap();
        analyser.push_stereo(&vec![0.0; 2048]);
        assert!(analyser.byte_frequency_data().iter().all(|b| *b == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let config = AnalyserConfig {
            smoothing_time_constant: 0.0,
            ..AnalyserConfig::default()
        };
        let analyser = SpectrumAnalyser::new(config).unwrap();

        // 44100 / 512 Hz per bin; bin 20 is ~1723 Hz
        let freq = 20.0 * 44100.0 / 512.0;
        analyser.push_stereo(&generate_sine(freq, 44100, 0.1));
        let bins = analyser.byte_frequency_data();

        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap();
        assert!((19..=21).contains(&peak), "peak at bin {peak}");
        assert!(bins[200] < bins[20]);
    }

    #[test]
    fn smoothing_decays_gradually() {
        let analyser = SpectrumAnalyser::new(AnalyserConfig::default()).unwrap();
        let freq = 20.0 * 44100.0 / 512.0;
        analyser.push_stereo(&generate_sine(freq, 44100, 0.1));
        for _ in 0..10 {
            analyser.byte_frequency_data();
        }
        let loud = analyser.byte_frequency_data()[20];

        analyser.push_stereo(&vec![0.0; 1024]);
        let next = analyser.byte_frequency_data()[20];
        assert!(next > 0 && next <= loud);
    }

    #[test]
    fn tap_does_not_alter_audio() {
        let analyser = Arc::new(SpectrumAnalyser::new(AnalyserConfig::default()).unwrap());
        let mut tap = AnalyserTap::new(analyser);
        let mut buffer = vec![0.1, 0.2, 0.3, 0.4];
        tap.process(&mut buffer, 44100);
        assert_eq!(buffer, vec![0.1, 0.2, 0.3, 0.4]);
    }
}
