//! Spectral analysis with FFT

pub mod analysis;
pub mod bands;
pub mod fft;
pub mod frame;
pub mod smoothing;
pub mod weighting;
pub mod windowing;
pub mod windows;

pub use analysis::{AnalyzerConfig, ConfigError, RealtimeAnalyzer};
pub use bands::FrequencyBand;
pub use fft::FftEngine;
pub use frame::Spectra;
pub use windows::WindowType;
