//! WAV file helpers (hound)
//!
//! Everything in memory is interleaved `f32` in [-1, 1]. Files on disk are
//! written as 16-bit PCM.

use super::input::AudioError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Seek, Write};
use std::path::Path;

/// A whole file decoded into memory
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Spec used for everything this crate writes
pub fn pcm16_spec(channels: u16, sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: channels.max(1),
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Read a WAV file into interleaved `f32`
///
/// Integer files of 8 to 32 bits and 32-bit float files are accepted.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<DecodedAudio, AudioError> {
    let mut reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if bits == 0 || bits > 32 {
                return Err(AudioError::UnsupportedSampleFormat(format!(
                    "{}-bit integer PCM",
                    bits
                )));
            }
            let scale = 1.0 / (1_i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    log::debug!(
        "Decoded {} ({} Hz, {} ch, {} samples)",
        path.as_ref().display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );

    Ok(DecodedAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Convert a float sample to 16-bit PCM, clipping out-of-range input
#[inline]
pub fn to_i16(sample: f32) -> i16 {
    let clipped = if sample.is_finite() { sample.clamp(-1.0, 1.0) } else { 0.0 };
    (clipped * i16::MAX as f32).round() as i16
}

/// Append interleaved samples to a 16-bit writer
pub fn write_pcm16<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    samples: &[f32],
) -> Result<(), AudioError> {
    for &s in samples {
        writer.write_sample(to_i16(s))?;
    }
    Ok(())
}

/// Change the channel count of interleaved audio
///
/// Mono is duplicated into every output channel, anything is averaged down to
/// mono, and other conversions copy the shared channels and zero the rest.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    let from = from.max(1);
    let to = to.max(1);
    if from == to {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);

    for frame in samples.chunks_exact(from) {
        if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            out.extend((0..to).map(|c| frame.get(c).copied().unwrap_or(0.0)));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_to_i16_clips() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), -i16::MAX);
        assert_eq!(to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_remap_channels() {
        assert_eq!(remap_channels(&[0.5, -0.5], 1, 2), vec![0.5, 0.5, -0.5, -0.5]);
        assert_eq!(remap_channels(&[1.0, 0.0, 0.5, 0.5], 2, 1), vec![0.5, 0.5]);
        assert_eq!(
            remap_channels(&[1.0, 2.0, 3.0], 3, 2),
            vec![1.0, 2.0]
        );
        assert_eq!(remap_channels(&[1.0, 2.0], 2, 3), vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_write_then_read_pcm16() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..200).map(|i| (i as f32 / 100.0) - 1.0).collect();
        let mut writer = WavWriter::create(&path, pcm16_spec(2, 22050)).unwrap();
        write_pcm16(&mut writer, &samples).unwrap();
        writer.finalize().unwrap();

        let decoded = read_wav(&path).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.frames(), 100);
        assert!((decoded.duration_secs() - 100.0 / 22050.0).abs() < 1e-9);

        for (a, b) in decoded.samples.iter().zip(&samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_read_float_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.25_f32, -0.75, 0.5] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let decoded = read_wav(&path).unwrap();
        assert_eq!(decoded.samples, vec![0.25, -0.75, 0.5]);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_wav(dir.path().join("nope.wav")).is_err());
    }
}
