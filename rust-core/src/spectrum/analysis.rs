//! Real-time band analyzer
//!
//! Turns one buffer of audio per channel into log-spaced band magnitudes:
//! window → FFT → A-weighting → band peak × gain → highlight → smoothing.

use super::bands::{band_peak, log_bands, FrequencyBand};
use super::fft::FftEngine;
use super::frame::{normalize, Spectra};
use super::smoothing::{highlight, smooth_into, DEFAULT_HIGHLIGHT_KERNEL};
use super::weighting::a_weights;
use super::windowing::AnalysisWindow;
use super::windows::WindowType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("FFT size must be an even number of at least 4 samples (got {0})")]
    FftSize(usize),

    #[error("At least one frequency band is required")]
    NoBands,

    #[error("Start frequency {start} Hz must be positive and below end frequency {end} Hz")]
    FrequencyRange { start: f64, end: f64 },

    #[error("Smoothing factor must be within 0.0..=1.0 (got {0})")]
    Smoothing(f32),

    #[error("Highlight kernel must have odd length (got {0})")]
    Kernel(usize),
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// FFT size (number of samples per channel per frame)
    pub fft_size: usize,

    /// Number of output bands
    pub frequency_bands: usize,

    /// Lower edge of the first band in Hz
    pub start_frequency: f64,

    /// Upper edge of the last band in Hz
    pub end_frequency: f64,

    /// Weight of the previous frame (0.0 = no smoothing)
    pub smoothing: f32,

    /// Multiplier applied to band peaks before normalisation
    pub gain: f32,

    /// Window type for spectral analysis
    pub window_type: WindowType,

    /// Apply the A-weighting curve to the amplitude spectrum
    pub apply_a_weighting: bool,

    /// Odd-length kernel for the neighbouring-band average
    pub highlight_kernel: Vec<f32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            frequency_bands: 80,
            start_frequency: 100.0,
            end_frequency: 18000.0,
            smoothing: 0.5,
            gain: 5.0,
            window_type: WindowType::Hann,
            apply_a_weighting: true,
            highlight_kernel: DEFAULT_HIGHLIGHT_KERNEL.to_vec(),
        }
    }
}

impl AnalyzerConfig {
    /// Check the configuration for values the analyzer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size < 4 || self.fft_size % 2 != 0 {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        if self.frequency_bands == 0 {
            return Err(ConfigError::NoBands);
        }
        if !(self.start_frequency > 0.0 && self.start_frequency < self.end_frequency) {
            return Err(ConfigError::FrequencyRange {
                start: self.start_frequency,
                end: self.end_frequency,
            });
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        if self.highlight_kernel.len() % 2 == 0 && !self.highlight_kernel.is_empty() {
            return Err(ConfigError::Kernel(self.highlight_kernel.len()));
        }
        Ok(())
    }
}

/// Real-time spectrum analyzer
///
/// Holds the previous frame for temporal smoothing, so one instance should
/// follow one stream.
pub struct RealtimeAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
    window: AnalysisWindow,
    bands: Vec<FrequencyBand>,
    /// A-weighting per bin, cached for `weights_rate`
    weights: Vec<f64>,
    weights_rate: f64,
    /// Scratch frame for the windowed signal
    windowed: Vec<f64>,
    /// Scratch amplitude spectrum after weighting
    weighted: Vec<f64>,
    /// Previous output per channel
    spectrum_buffer: Vec<Vec<f32>>,
}

impl RealtimeAnalyzer {
    /// Create new analyzer
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let fft_engine = FftEngine::new(config.fft_size);
        let window = AnalysisWindow::new(config.window_type, config.fft_size);
        let bands = log_bands(
            config.start_frequency,
            config.end_frequency,
            config.frequency_bands,
        );
        let num_bins = fft_engine.num_bins();

        Ok(Self {
            fft_engine,
            window,
            bands,
            weights: Vec::new(),
            weights_rate: 0.0,
            windowed: vec![0.0; config.fft_size],
            weighted: vec![0.0; num_bins],
            spectrum_buffer: Vec::new(),
            config,
        })
    }

    /// Analyse one buffer per channel
    ///
    /// # Arguments
    /// * `channels` - One slice of samples per channel; the first `fft_size`
    ///   samples of each are used, shorter slices are zero-padded
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// Smoothed band magnitudes, one vector per input channel
    pub fn analyse<S: AsRef<[f64]>>(&mut self, channels: &[S], sample_rate: f64) -> Spectra {
        let bands = self.bands.len();

        if channels.is_empty() {
            return Spectra::default();
        }
        let usable_rate = sample_rate.is_finite() && sample_rate > 0.0;
        if !usable_rate || channels.iter().all(|c| c.as_ref().is_empty()) {
            return Spectra::silent(channels.len(), bands);
        }

        if self.spectrum_buffer.len() != channels.len() {
            self.spectrum_buffer = vec![vec![0.0; bands]; channels.len()];
        }
        if self.config.apply_a_weighting && self.weights_rate != sample_rate {
            self.weights = a_weights(
                self.fft_engine.num_bins(),
                self.fft_engine.bin_width_hz(sample_rate),
            );
            self.weights_rate = sample_rate;
        }

        let bin_width = self.fft_engine.bin_width_hz(sample_rate);
        let correction = self.window.correction();
        let gain = self.config.gain as f64;

        for (index, channel) in channels.iter().enumerate() {
            self.window.apply_into(channel.as_ref(), &mut self.windowed);
            let amplitudes = self.fft_engine.amplitudes(&self.windowed);

            for (k, (w, &a)) in self.weighted.iter_mut().zip(amplitudes).enumerate() {
                let weight = if self.config.apply_a_weighting {
                    self.weights[k]
                } else {
                    1.0
                };
                *w = a * correction * weight;
            }

            let spectrum: Vec<f32> = self
                .bands
                .iter()
                .map(|band| (band_peak(band, &self.weighted, bin_width) * gain) as f32)
                .collect();
            let spectrum = highlight(&spectrum, &self.config.highlight_kernel);

            let previous = &mut self.spectrum_buffer[index];
            smooth_into(previous, &spectrum, self.config.smoothing);
            for v in previous.iter_mut() {
                *v = normalize(*v);
            }
        }

        Spectra::new(self.spectrum_buffer.clone())
    }

    /// Forget the smoothing history
    pub fn reset(&mut self) {
        self.spectrum_buffer.clear();
    }

    /// All-zero frame matching the configured band count
    pub fn silence(&self, channels: usize) -> Spectra {
        Spectra::silent(channels, self.bands.len())
    }

    /// Replace the configuration, rebuilding FFT state where needed
    pub fn update_config(&mut self, config: AnalyzerConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if config.fft_size != self.config.fft_size {
            self.fft_engine = FftEngine::new(config.fft_size);
            self.windowed = vec![0.0; config.fft_size];
            self.weighted = vec![0.0; self.fft_engine.num_bins()];
            self.weights_rate = 0.0;
        }
        if config.fft_size != self.config.fft_size || config.window_type != self.config.window_type {
            self.window = AnalysisWindow::new(config.window_type, config.fft_size);
        }
        if config.frequency_bands != self.config.frequency_bands
            || config.start_frequency != self.config.start_frequency
            || config.end_frequency != self.config.end_frequency
        {
            self.bands = log_bands(
                config.start_frequency,
                config.end_frequency,
                config.frequency_bands,
            );
            self.spectrum_buffer.clear();
        }

        self.config = config;
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Band edges in Hz
    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn frequency_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }
}
