//! Python bindings for device listing and file joining

use crate::audio::input::{list_input_devices, AudioDeviceInfo};
use crate::audio::join_wav_files;
use crate::audio::output::list_output_devices;
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

/// Audio device information exposed to Python
#[pyclass(name = "AudioDeviceInfo")]
#[derive(Clone)]
pub struct PyAudioDeviceInfo {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub sample_rate: u32,
    #[pyo3(get)]
    pub channels: u16,
}

impl From<AudioDeviceInfo> for PyAudioDeviceInfo {
    fn from(d: AudioDeviceInfo) -> Self {
        Self {
            name: d.name,
            sample_rate: d.sample_rate,
            channels: d.channels,
        }
    }
}

/// List available input devices
#[pyfunction]
#[pyo3(name = "list_input_devices")]
pub fn py_list_input_devices() -> PyResult<Vec<PyAudioDeviceInfo>> {
    list_input_devices()
        .map(|devices| devices.into_iter().map(Into::into).collect())
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to list devices: {}", e)))
}

/// List available output devices
#[pyfunction]
#[pyo3(name = "list_output_devices")]
pub fn py_list_output_devices() -> PyResult<Vec<PyAudioDeviceInfo>> {
    list_output_devices()
        .map(|devices| devices.into_iter().map(Into::into).collect())
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to list devices: {}", e)))
}

/// Concatenate WAV files
///
/// Args:
///     paths: Input files, in order
///     output: Output file
///
/// Returns:
///     (output_path, frames_written)
#[pyfunction]
#[pyo3(name = "join_wav_files")]
pub fn py_join_wav_files(paths: Vec<String>, output: String) -> PyResult<(String, u64)> {
    join_wav_files(paths.as_slice(), &output)
        .map(|(path, frames)| (path.to_string_lossy().into_owned(), frames))
        .map_err(|e| PyRuntimeError::new_err(format!("Join failed: {}", e)))
}
