//! Sample rate conversion to the output device rate

use crate::error::{OutputError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use vibe_core::{AudioBuffer, AudioFormat, SampleRate};

/// Convert `buffer` to `target_rate`
///
/// Buffers already at the target rate are returned unchanged.
pub fn resample(buffer: AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    let source_rate = buffer.format.sample_rate.as_hz();
    if source_rate == target_rate || buffer.is_empty() || buffer.format.channels == 0 {
        return Ok(buffer);
    }

    let channels = buffer.format.channels as usize;
    let frames = buffer.frames();

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(target_rate) / f64::from(source_rate),
        2.0,
        params,
        frames,
        channels,
    )
    .map_err(|e| OutputError::ResampleError(e.to_string()))?;

    let mut deinterleaved = vec![Vec::with_capacity(frames); channels];
    for frame in buffer.samples.chunks_exact(channels) {
        for (channel, sample) in deinterleaved.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let resampled = resampler
        .process(&deinterleaved, None)
        .map_err(|e| OutputError::ResampleError(e.to_string()))?;

    let output_frames = resampled.first().map_or(0, Vec::len);
    let mut interleaved = Vec::with_capacity(output_frames * channels);
    for frame in 0..output_frames {
        for channel in &resampled {
            interleaved.push(channel[frame]);
        }
    }

    Ok(AudioBuffer::new(
        interleaved,
        AudioFormat::new(SampleRate::new(target_rate), buffer.format.channels),
    ))
}
