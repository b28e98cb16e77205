//! Record Spectrum - audio recorder and player with a live spectrum analyzer
//!
//! Captures to WAV, plays WAV files back and turns either stream into
//! log-spaced band magnitudes for a two-channel bar display.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![allow(non_local_definitions)]

pub mod audio;
pub mod config;
pub mod spectrum;
pub mod view;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{AudioError, AudioPlayer, AudioRecorder, PlaybackState, RecorderState};
pub use config::AppConfig;
pub use spectrum::{AnalyzerConfig, RealtimeAnalyzer, Spectra, WindowType};
