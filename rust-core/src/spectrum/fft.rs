//! FFT engine using realfft for real-valued signals
//!
//! Optimized for real-time spectral analysis: the plan and every buffer are
//! allocated once per FFT size.

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum, N/2 + 1 bins)
    output_buffer: Vec<Complex<f64>>,

    /// Scratch space for the FFT itself
    scratch: Vec<Complex<f64>>,

    /// Reusable single-sided amplitude spectrum (N/2 bins)
    amplitudes: Vec<f64>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples, must be even and non-zero)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();
        let scratch = r2c.make_scratch_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
            scratch,
            amplitudes: vec![0.0; fft_size / 2],
        }
    }

    /// Compute the single-sided amplitude spectrum
    ///
    /// Bin 0 is `|X[0]| / N`, every other bin `2|X[k]| / N`, so a sinusoid of
    /// amplitude A on an exact bin reads A (before window correction). The
    /// Nyquist bin is dropped, leaving fft_size/2 values.
    pub fn amplitudes(&mut self, signal: &[f64]) -> &[f64] {
        if !self.transform(signal) {
            self.amplitudes.fill(0.0);
            return &self.amplitudes;
        }

        let norm = 1.0 / self.fft_size as f64;
        for (k, (amp, c)) in self
            .amplitudes
            .iter_mut()
            .zip(self.output_buffer.iter())
            .enumerate()
        {
            let scale = if k == 0 { norm } else { 2.0 * norm };
            *amp = c.norm() * scale;
        }

        &self.amplitudes
    }

    /// Run the forward transform into `output_buffer`
    fn transform(&mut self, signal: &[f64]) -> bool {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        match self.r2c.process_with_scratch(
            &mut self.input_buffer,
            &mut self.output_buffer,
            &mut self.scratch,
        ) {
            Ok(()) => true,
            Err(e) => {
                log::error!("FFT processing failed: {}", e);
                false
            }
        }
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of amplitude bins produced by [`FftEngine::amplitudes`]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Width of one bin in Hz
    pub fn bin_width_hz(&self, sample_rate: f64) -> f64 {
        sample_rate / self.fft_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(1024);

        // DC signal (constant), zero-padded from 100 samples
        let signal = vec![1.0; 100];
        let amps = fft.amplitudes(&signal);

        assert_eq!(amps.len(), 512);
        assert!((amps[0] - 100.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn test_amplitude_of_bin_centred_sine() {
        let mut fft = FftEngine::new(1024);

        // Exactly 32 cycles in the frame
        let signal: Vec<f64> = (0..1024)
            .map(|n| 0.75 * (2.0 * PI * 32.0 * n as f64 / 1024.0).sin())
            .collect();

        let amps = fft.amplitudes(&signal);
        assert_eq!(amps.len(), 512);
        assert!((amps[32] - 0.75).abs() < 1e-9);
        assert!(amps[10] < 1e-9);
    }

    #[test]
    fn test_amplitude_of_dc_is_not_doubled() {
        let mut fft = FftEngine::new(256);
        let amps = fft.amplitudes(&vec![0.5; 256]);

        assert!((amps[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bin_geometry() {
        let fft = FftEngine::new(2048);

        assert_eq!(fft.num_bins(), 1024);
        assert!((fft.bin_width_hz(44100.0) - 44100.0 / 2048.0).abs() < 1e-12);
    }
}
