//! Per-frame spectrum data handed to consumers

use serde::{Deserialize, Serialize};

/// One analysed frame: band magnitudes per channel
///
/// Values are always finite and within `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectra {
    pub channels: Vec<Vec<f32>>,
}

impl Spectra {
    /// Build a frame, clamping every value into `[0, 1]`
    pub fn new(mut channels: Vec<Vec<f32>>) -> Self {
        for channel in channels.iter_mut() {
            for v in channel.iter_mut() {
                *v = normalize(*v);
            }
        }
        Self { channels }
    }

    /// The "no spectrum" frame: all bands at zero
    pub fn silent(channels: usize, bands: usize) -> Self {
        Self {
            channels: vec![vec![0.0; bands]; channels],
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Bands per channel (0 for an empty frame)
    pub fn num_bands(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn left(&self) -> &[f32] {
        self.channels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn right(&self) -> &[f32] {
        self.channels.get(1).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when every band of every channel is zero
    pub fn is_silent(&self) -> bool {
        self.channels.iter().flatten().all(|&v| v == 0.0)
    }

    /// Pad a mono frame with a zeroed right channel
    ///
    /// Frames with two or more channels are returned unchanged.
    pub fn into_stereo(mut self) -> Self {
        match self.channels.len() {
            0 => Self::silent(2, 0),
            1 => {
                let bands = self.channels[0].len();
                self.channels.push(vec![0.0; bands]);
                self
            }
            _ => self,
        }
    }

    /// Loudest band across all channels
    pub fn peak(&self) -> f32 {
        self.channels.iter().flatten().copied().fold(0.0, f32::max)
    }
}

/// Map any value onto `[0, 1]`, sending NaN and negatives to 0
pub fn normalize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sanitizes_values() {
        let spectra = Spectra::new(vec![vec![f32::NAN, -1.0, 0.5, 3.0, f32::INFINITY]]);
        assert_eq!(spectra.channels[0], vec![0.0, 0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_mono_pads_to_stereo() {
        let stereo = Spectra::new(vec![vec![0.2, 0.4]]).into_stereo();

        assert_eq!(stereo.num_channels(), 2);
        assert_eq!(stereo.left(), &[0.2, 0.4]);
        assert_eq!(stereo.right(), &[0.0, 0.0]);
    }

    #[test]
    fn test_silent_frame() {
        let silent = Spectra::silent(2, 80);

        assert_eq!(silent.num_bands(), 80);
        assert!(silent.is_silent());
        assert_eq!(silent.peak(), 0.0);
        assert!(Spectra::default().right().is_empty());
    }
}
