//! Windowing for spectral analysis
//!
//! Applies windows to time-domain frames before the FFT to reduce spectral leakage

use super::windows::{generate_window, WindowType};

/// Precomputed analysis window
///
/// Coefficients are generated once per FFT size so the audio path never
/// allocates or evaluates cosines.
#[derive(Debug, Clone)]
pub struct AnalysisWindow {
    coefficients: Vec<f64>,
    correction: f64,
}

impl AnalysisWindow {
    /// Create a periodic window of the given length
    pub fn new(window_type: WindowType, length: usize) -> Self {
        let coefficients = generate_window(window_type, length);
        let correction = amplitude_correction(&coefficients);

        Self {
            coefficients,
            correction,
        }
    }

    /// Copy `signal` into `out`, multiplied by the window
    ///
    /// `out` is filled up to the window length; samples past the end of
    /// `signal` are zero.
    pub fn apply_into(&self, signal: &[f64], out: &mut [f64]) {
        let len = out.len().min(self.coefficients.len());
        let copy_len = signal.len().min(len);

        for ((o, &s), &w) in out[..copy_len]
            .iter_mut()
            .zip(signal.iter())
            .zip(self.coefficients.iter())
        {
            *o = s * w;
        }
        out[copy_len..].fill(0.0);
    }

    /// Factor that restores the amplitude lost to windowing
    pub fn correction(&self) -> f64 {
        self.correction
    }
}

fn amplitude_correction(window: &[f64]) -> f64 {
    let sum: f64 = window.iter().sum();
    if sum <= 0.0 {
        1.0
    } else {
        window.len() as f64 / sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_into_zero_pads() {
        let window = AnalysisWindow::new(WindowType::Rectangular, 8);
        let mut out = vec![9.0; 8];
        window.apply_into(&[1.0, 2.0, 3.0], &mut out);

        assert_eq!(out, vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_correction_factor() {
        let rect = AnalysisWindow::new(WindowType::Rectangular, 1024);
        let hann = AnalysisWindow::new(WindowType::Hann, 1024);

        assert!((rect.correction() - 1.0).abs() < 1e-12);
        // Periodic Hann sums to exactly N/2
        assert!((hann.correction() - 2.0).abs() < 1e-9);
    }
}
