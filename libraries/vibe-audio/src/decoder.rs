/// Audio decoder implementation using Symphonia
use crate::error::{AudioError, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer as SymphoniaBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};
use vibe_core::{AudioBuffer, AudioFormat, SampleRate};

/// Mix level for centre and surround channels folded into stereo (-3 dB)
const CENTER_MIX: f32 = 0.707;

/// Full-file decoder using Symphonia
///
/// Supports: MP3, FLAC, OGG, WAV, AAC. Output is always interleaved stereo
/// f32 at the file's native sample rate.
#[derive(Debug, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    /// Decode a file on disk
    pub fn decode_path(&self, path: &Path) -> Result<AudioBuffer> {
        let file = std::fs::File::open(path)?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        self.decode_source(Box::new(file), &hint)
    }

    /// Decode an in-memory file, e.g. an uploaded track's bytes
    pub fn decode_bytes(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioBuffer> {
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        self.decode_source(Box::new(Cursor::new(bytes)), &hint)
    }

    fn decode_source(&self, source: Box<dyn MediaSource>, hint: &Hint) -> Result<AudioBuffer> {
        let mss = MediaSourceStream::new(source, Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to probe: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| AudioError::DecodeError("No audio tracks found".to_string()))?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Symphonia(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(e) => {
                    return Err(AudioError::Symphonia(format!("Error reading packet: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => append_stereo(&decoded, &mut samples),
                // A corrupt packet is skipped, the rest of the file still plays
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(error = e, "Skipping undecodable packet");
                }
                Err(e) => return Err(AudioError::DecodeError(e.to_string())),
            }
        }

        debug!(
            sample_rate,
            frames = samples.len() / 2,
            "Decoded audio"
        );

        Ok(AudioBuffer::new(
            samples,
            AudioFormat::stereo(SampleRate::new(sample_rate)),
        ))
    }
}

fn append_stereo(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::U16(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::U24(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::U32(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::S8(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::S16(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::S24(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::S32(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::F32(buf) => fold_to_stereo(buf, out),
        AudioBufferRef::F64(buf) => fold_to_stereo(buf, out),
    }
}

/// Interleave a planar buffer as stereo
///
/// Mono is duplicated. With more than two channels, channel 2 is treated as
/// centre and mixed into both sides; further channels alternate left/right.
fn fold_to_stereo<T>(buf: &SymphoniaBuffer<T>, out: &mut Vec<f32>)
where
    T: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    out.reserve(frames * 2);

    match channels {
        0 => out.resize(out.len() + frames * 2, 0.0),
        1 => {
            for &s in buf.chan(0) {
                let v: f32 = s.into_sample();
                out.push(v);
                out.push(v);
            }
        }
        _ => {
            for i in 0..frames {
                let mut left: f32 = buf.chan(0)[i].into_sample();
                let mut right: f32 = buf.chan(1)[i].into_sample();
                for c in 2..channels {
                    let v: f32 = buf.chan(c)[i].into_sample();
                    let v = v * CENTER_MIX;
                    if c == 2 {
                        left += v;
                        right += v;
                    } else if c % 2 == 0 {
                        left += v;
                    } else {
                        right += v;
                    }
                }
                out.push(left.clamp(-1.0, 1.0));
                out.push(right.clamp(-1.0, 1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV writer
    fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * u32::from(block_align)).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn decodes_mono_wav_to_stereo() {
        let samples: Vec<i16> = (0..4410).map(|i| ((i % 100) * 100) as i16).collect();
        let bytes = wav_bytes(1, 22050, &samples);

        let buffer = SymphoniaDecoder::new()
            .decode_bytes(bytes, Some("wav"))
            .unwrap();

        assert_eq!(buffer.format.sample_rate.as_hz(), 22050);
        assert_eq!(buffer.format.channels, 2);
        assert_eq!(buffer.frames(), 4410);
        assert_eq!(buffer.samples[2], buffer.samples[3]);
        assert!((buffer.duration_secs() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn decodes_stereo_wav_from_disk() {
        let samples: Vec<i16> = (0..2000)
            .flat_map(|_| [16384i16, -16384i16])
            .collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, wav_bytes(2, 44100, &samples)).unwrap();

        let buffer = SymphoniaDecoder::new().decode_path(&path).unwrap();
        assert_eq!(buffer.frames(), 2000);
        assert!((buffer.samples[0] - 0.5).abs() < 1e-3);
        assert!((buffer.samples[1] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn garbage_is_rejected() {
        let result = SymphoniaDecoder::new().decode_bytes(vec![0u8; 64], None);
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SymphoniaDecoder::new().decode_path(Path::new("/nonexistent/track.mp3"));
        assert!(matches!(result, Err(AudioError::Io(_))));
    }
}
