//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod audio_bindings;
mod spectrum_bindings;

/// Python module definition
#[pymodule]
fn record_spectrum(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<spectrum_bindings::PyRealtimeAnalyzer>()?;
    m.add_class::<spectrum_bindings::PyWindowType>()?;
    m.add_class::<audio_bindings::PyAudioDeviceInfo>()?;

    m.add_function(wrap_pyfunction!(audio_bindings::py_list_input_devices, m)?)?;
    m.add_function(wrap_pyfunction!(audio_bindings::py_list_output_devices, m)?)?;
    m.add_function(wrap_pyfunction!(audio_bindings::py_join_wav_files, m)?)?;

    Ok(())
}
