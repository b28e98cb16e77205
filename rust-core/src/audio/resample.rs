//! Sample-rate conversion with rubato

use super::input::AudioError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHUNK_FRAMES: usize = 1024;

/// Resample interleaved audio from `from_rate` to `to_rate`
///
/// # Returns
/// Interleaved samples at the new rate, `round(frames * to / from)` frames long
pub fn resample(
    samples: &[f32],
    channels: usize,
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, AudioError> {
    let channels = channels.max(1);
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::Resample(format!(
            "cannot convert {} Hz to {} Hz",
            from_rate, to_rate
        )));
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let planar = deinterleave(samples, channels);
    let frames = planar[0].len();
    let expected = (frames as f64 * ratio).round() as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected); channels];

    let mut pos = 0;
    while pos + resampler.input_frames_next() <= frames {
        let n = resampler.input_frames_next();
        let chunk: Vec<&[f32]> = planar.iter().map(|c| &c[pos..pos + n]).collect();
        let out = resampler
            .process(&chunk, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        append(&mut output, out);
        pos += n;
    }

    if pos < frames {
        let tail: Vec<&[f32]> = planar.iter().map(|c| &c[pos..]).collect();
        let out = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        append(&mut output, out);
    }

    // Push the filter's delay line out until we have enough frames
    while output[0].len() < expected {
        let out = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if out.first().map_or(true, |c| c.is_empty()) {
            break;
        }
        append(&mut output, out);
    }

    for channel in output.iter_mut() {
        channel.resize(expected, 0.0);
    }

    Ok(interleave(&output))
}

/// Split interleaved samples into one buffer per channel
pub fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let channels = channels.max(1);
    let mut planar = vec![Vec::with_capacity(samples.len() / channels); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &s) in planar.iter_mut().zip(frame) {
            channel.push(s);
        }
    }
    planar
}

/// Inverse of [`deinterleave`]; stops at the shortest channel
pub fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        out.extend(planar.iter().map(|c| c[i]));
    }
    out
}

fn append(output: &mut [Vec<f32>], chunk: Vec<Vec<f32>>) {
    for (dst, src) in output.iter_mut().zip(chunk) {
        dst.extend(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_same_rate_is_passthrough() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample(&samples, 2, 48000, 48000).unwrap(), samples);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let samples = vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0];
        let planar = deinterleave(&samples, 2);
        assert_eq!(planar, vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]]);
        assert_eq!(interleave(&planar), samples);
    }

    #[test]
    fn test_upsample_length_and_level() {
        let frames = 22050;
        let samples: Vec<f32> = (0..frames)
            .map(|n| 0.5 * (2.0 * PI * 440.0 * n as f32 / 22050.0).sin())
            .collect();

        let out = resample(&samples, 1, 22050, 44100).unwrap();
        assert_eq!(out.len(), 44100);

        // Away from the edges the level should survive conversion
        let peak = out[4000..40000].iter().fold(0.0_f32, |m, &s| m.max(s.abs()));
        assert!(peak > 0.4 && peak < 0.6, "peak {}", peak);
    }

    #[test]
    fn test_downsample_stereo_length() {
        let samples = vec![0.0_f32; 48000 * 2];
        let out = resample(&samples, 2, 48000, 44100).unwrap();
        assert_eq!(out.len(), 44100 * 2);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(resample(&[0.0; 4], 1, 0, 44100).is_err());
    }
}
