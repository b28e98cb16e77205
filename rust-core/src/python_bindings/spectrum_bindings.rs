//! Python bindings for the band analyzer

use crate::spectrum::{AnalyzerConfig, RealtimeAnalyzer, WindowType};
use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Real-time band analyzer exposed to Python
#[pyclass(name = "RealtimeAnalyzer")]
pub struct PyRealtimeAnalyzer {
    analyzer: RealtimeAnalyzer,
}

#[pymethods]
impl PyRealtimeAnalyzer {
    /// Create a new analyzer
    ///
    /// Args:
    ///     fft_size: Samples per channel per frame
    ///     frequency_bands: Number of log-spaced output bands
    ///     start_frequency: Lower edge of the first band in Hz
    ///     end_frequency: Upper edge of the last band in Hz
    ///     smoothing: Weight of the previous frame (0.0 - 1.0)
    ///     window_type: Window applied before the FFT
    ///     a_weighting: Apply the A-weighting curve
    #[new]
    #[pyo3(signature = (
        fft_size=2048,
        frequency_bands=80,
        start_frequency=100.0,
        end_frequency=18000.0,
        smoothing=0.5,
        window_type=PyWindowType::Hann,
        a_weighting=true
    ))]
    fn new(
        fft_size: usize,
        frequency_bands: usize,
        start_frequency: f64,
        end_frequency: f64,
        smoothing: f32,
        window_type: PyWindowType,
        a_weighting: bool,
    ) -> PyResult<Self> {
        let config = AnalyzerConfig {
            fft_size,
            frequency_bands,
            start_frequency,
            end_frequency,
            smoothing,
            window_type: window_type.into(),
            apply_a_weighting: a_weighting,
            ..AnalyzerConfig::default()
        };

        let analyzer = RealtimeAnalyzer::new(config)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { analyzer })
    }

    /// Analyse one buffer per channel
    ///
    /// Args:
    ///     channels: List of numpy arrays, one per channel
    ///     sample_rate: Sample rate in Hz
    ///
    /// Returns:
    ///     List of band magnitude arrays (values in 0.0 - 1.0)
    fn analyse<'py>(
        &mut self,
        py: Python<'py>,
        channels: Vec<PyReadonlyArray1<f64>>,
        sample_rate: f64,
    ) -> PyResult<Vec<&'py PyArray1<f32>>> {
        let slices = channels
            .iter()
            .map(|c| c.as_slice().map_err(|e| PyValueError::new_err(e.to_string())))
            .collect::<PyResult<Vec<&[f64]>>>()?;

        let spectra = self.analyzer.analyse(&slices, sample_rate);
        Ok(spectra
            .channels
            .into_iter()
            .map(|c| PyArray1::from_vec(py, c))
            .collect())
    }

    /// Forget the smoothing history
    fn reset(&mut self) {
        self.analyzer.reset();
    }

    /// Band edges as (lower_hz, upper_hz) pairs
    fn bands(&self) -> Vec<(f64, f64)> {
        self.analyzer
            .bands()
            .iter()
            .map(|b| (b.lower_hz, b.upper_hz))
            .collect()
    }

    #[getter]
    fn frequency_bands(&self) -> usize {
        self.analyzer.frequency_bands()
    }

    #[getter]
    fn fft_size(&self) -> usize {
        self.analyzer.fft_size()
    }

    /// Change smoothing or band count without rebuilding the object
    #[pyo3(signature = (smoothing=None, frequency_bands=None))]
    fn update_config(&mut self, smoothing: Option<f32>, frequency_bands: Option<usize>) -> PyResult<()> {
        let mut config = self.analyzer.config().clone();
        if let Some(s) = smoothing {
            config.smoothing = s;
        }
        if let Some(bands) = frequency_bands {
            config.frequency_bands = bands;
        }
        self.analyzer
            .update_config(config)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }
}
