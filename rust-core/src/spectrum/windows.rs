//! Window functions for spectral analysis
//!
//! Tapers applied to each analysis frame before the FFT to reduce leakage
//! between neighbouring bins.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/M)
    /// Sidelobe attenuation: ~31 dB, coherent gain 0.5
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/M)
    /// Sidelobe attenuation: ~43 dB, coherent gain 0.54
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/M) + 0.08*cos(4πn/M)
    /// Sidelobe attenuation: ~58 dB, coherent gain 0.42
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

/// Generate periodic window coefficients
///
/// Periodic windows (denominator M rather than M-1) tile seamlessly, which
/// is what an FFT frame wants.
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    if length == 1 {
        return vec![1.0];
    }

    let denom = length as f64;

    match window_type {
        WindowType::Hann => (0..length)
            .map(|n| {
                let angle = 2.0 * PI * n as f64 / denom;
                0.5 - 0.5 * angle.cos()
            })
            .collect(),

        WindowType::Hamming => (0..length)
            .map(|n| {
                let angle = 2.0 * PI * n as f64 / denom;
                0.54 - 0.46 * angle.cos()
            })
            .collect(),

        WindowType::Blackman => (0..length)
            .map(|n| {
                let angle1 = 2.0 * PI * n as f64 / denom;
                let angle2 = 4.0 * PI * n as f64 / denom;
                0.42 - 0.5 * angle1.cos() + 0.08 * angle2.cos()
            })
            .collect(),

        WindowType::Rectangular => vec![1.0; length],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_generation() {
        let length = 160;

        let hann = generate_window(WindowType::Hann, length);
        let hamming = generate_window(WindowType::Hamming, length);
        let blackman = generate_window(WindowType::Blackman, length);

        assert_eq!(hann.len(), length);
        assert_eq!(hamming.len(), length);
        assert_eq!(blackman.len(), length);

        // Periodic windows mirror around M/2: w[n] == w[M-n]
        for n in 1..length / 2 {
            assert!((hann[n] - hann[length - n]).abs() < 1e-10);
            assert!((hamming[n] - hamming[length - n]).abs() < 1e-10);
            assert!((blackman[n] - blackman[length - n]).abs() < 1e-10);
        }

        let center = length / 2;
        assert!((hann[center] - 1.0).abs() < 1e-10);
        assert!((hamming[center] - 1.0).abs() < 1e-10);
        assert!((blackman[center] - 1.0).abs() < 1e-10);

        // Hamming keeps a pedestal of 0.08 at the edges
        assert!(hamming[0] > 0.07 && hamming[0] < 0.09);
    }

    #[test]
    fn test_periodic_hann_mean_is_half() {
        let window = generate_window(WindowType::Hann, 2048);
        let mean: f64 = window.iter().sum::<f64>() / window.len() as f64;

        assert!((mean - 0.5).abs() < 1e-12);
        assert_eq!(window[0], 0.0);
        assert!((window[1024] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(generate_window(WindowType::Hann, 0).is_empty());
        assert_eq!(generate_window(WindowType::Blackman, 1), vec![1.0]);
    }

    #[test]
    fn test_rectangular_window() {
        let window = generate_window(WindowType::Rectangular, 100);
        assert_eq!(window.len(), 100);
        assert!(window.iter().all(|&w| w == 1.0));
    }
}
